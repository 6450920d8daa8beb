//! Error type for the conversion pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting files
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cleaning or combining tables failed
    #[error(transparent)]
    Core(#[from] agedist_core::Error),

    /// Reading a spreadsheet failed
    #[error(transparent)]
    Xlsx(#[from] agedist_xlsx::XlsxError),

    /// Reading or writing CSV failed
    #[error(transparent)]
    Csv(#[from] agedist_csv::CsvError),

    /// A step failed for one specific file
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A tuples file does not rebuild its table file
    #[error("{} does not match {}", tuples.display(), table.display())]
    Mismatch { table: PathBuf, tuples: PathBuf },
}

impl Error {
    /// Attach the path being processed
    pub fn in_file<P: Into<PathBuf>>(self, path: P) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
