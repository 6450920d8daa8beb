//! # agedist
//!
//! Convert Czech population-by-age spreadsheets into CSV.
//!
//! Each published sheet lists one age category per row and one NUTS/LAU
//! region per column. Conversion cleans the sheet, keys every row by
//! `(date, sex, age)` and writes two layouts next to each other:
//!
//! - `<prefix>_table.csv`: `date,sex,age` followed by one column per region
//! - `<prefix>_tuples.csv`: `date,sex,age,region,population`, one line per cell
//!
//! ## Example
//!
//! ```rust,no_run
//! use agedist::prelude::*;
//!
//! let converter = Converter::new("original", "converted");
//! let summary = converter.run(&Manifest::default_2019())?;
//! println!("wrote {} combined tables", summary.combined.len());
//! # Ok::<(), agedist::Error>(())
//! ```

pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod prelude;

pub use error::{Error, Result};
pub use manifest::{DateGroup, Manifest, SourceFile};
pub use pipeline::{check, load, save, Converter, RunSummary};

// Re-export core types
pub use agedist_core::{
    load_grid, parse_region_header, CellValue, Grid, HeaderPolicy, LoadOptions, Observation,
    ObservationTable, RegionHeader, RowKey, Sex, TupleRecord, AGE_COLUMN,
};

// Re-export I/O types
pub use agedist_csv::{
    output_paths, CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter,
    LineTerminator, SavedFiles,
};
pub use agedist_xlsx::{Sheet, XlsxError, XlsxReader};
