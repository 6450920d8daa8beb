//! CSV writer

use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CsvResult;
use crate::options::CsvWriteOptions;
use crate::{KEY_COLUMNS, TUPLE_COLUMNS};
use agedist_core::ObservationTable;

/// Paths written by [`CsvWriter::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFiles {
    pub table: PathBuf,
    pub tuples: PathBuf,
}

/// `<prefix>_table.csv` and `<prefix>_tuples.csv`
pub fn output_paths<P: AsRef<Path>>(prefix: P) -> SavedFiles {
    let with_suffix = |suffix: &str| {
        let mut path = OsString::from(prefix.as_ref().as_os_str());
        path.push(suffix);
        PathBuf::from(path)
    };

    SavedFiles {
        table: with_suffix("_table.csv"),
        tuples: with_suffix("_tuples.csv"),
    }
}

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write both layouts next to each other, creating or overwriting them
    pub fn save<P: AsRef<Path>>(
        prefix: P,
        table: &ObservationTable,
        options: &CsvWriteOptions,
    ) -> CsvResult<SavedFiles> {
        let paths = output_paths(prefix);

        info!("Saving as table into {}", paths.table.display());
        Self::write_table(table, File::create(&paths.table)?, options)?;

        info!("Saving as tuples into {}", paths.tuples.display());
        Self::write_tuples(table, File::create(&paths.tuples)?, options)?;

        Ok(paths)
    }

    /// Write the wide layout: key columns followed by one column per region
    pub fn write_table<W: Write>(
        table: &ObservationTable,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = options.builder().from_writer(writer);

        let header = KEY_COLUMNS
            .iter()
            .copied()
            .chain(table.regions().iter().map(String::as_str));
        csv_writer.write_record(header)?;

        let mut record = csv::StringRecord::new();
        for row in table.rows() {
            record.clear();
            record.push_field(&row.key.date.to_string());
            record.push_field(row.key.sex.code());
            record.push_field(&row.key.age);
            for value in &row.values {
                record.push_field(&value.to_string());
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the long layout, one record per cell in column-major order
    pub fn write_tuples<W: Write>(
        table: &ObservationTable,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let mut csv_writer = options.builder().from_writer(writer);

        csv_writer.write_record(TUPLE_COLUMNS)?;
        for tuple in table.tuples() {
            csv_writer.serialize(tuple)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
