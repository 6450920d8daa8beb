//! CSV reader for the table and tuple layouts

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use crate::{KEY_COLUMNS, TUPLE_COLUMNS};
use agedist_core::{ObservationTable, RowKey, Sex, TupleRecord};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a `_table.csv` file
    pub fn read_table_file<P: AsRef<Path>>(
        path: P,
        options: &CsvReadOptions,
    ) -> CsvResult<ObservationTable> {
        let file = File::open(path)?;
        Self::read_table(file, options)
    }

    /// Read a `_tuples.csv` file
    pub fn read_tuples_file<P: AsRef<Path>>(
        path: P,
        options: &CsvReadOptions,
    ) -> CsvResult<Vec<TupleRecord>> {
        let file = File::open(path)?;
        Self::read_tuples(file, options)
    }

    /// Read the wide layout back into an observation table
    pub fn read_table<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<ObservationTable> {
        let mut csv_reader = options.builder().from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let keys: Vec<&str> = headers.iter().take(KEY_COLUMNS.len()).collect();
        if keys != KEY_COLUMNS {
            return Err(CsvError::Parse {
                line: 1,
                message: format!("expected leading columns {:?}, found {:?}", KEY_COLUMNS, keys),
            });
        }

        let regions = headers
            .iter()
            .skip(KEY_COLUMNS.len())
            .map(str::to_string)
            .collect();
        let mut table = ObservationTable::new(regions)?;

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            let date = Self::parse_date(record.get(0).unwrap_or_default(), line)?;
            let sex: Sex = record.get(1).unwrap_or_default().parse()?;
            let age = record.get(2).unwrap_or_default().to_string();

            let values = record
                .iter()
                .skip(KEY_COLUMNS.len())
                .map(|field| {
                    field.trim().parse::<u64>().map_err(|_| CsvError::Parse {
                        line,
                        message: format!("{:?} is not a non-negative integer", field),
                    })
                })
                .collect::<CsvResult<Vec<_>>>()?;

            table.push(RowKey::new(date, sex, age), values)?;
        }

        Ok(table)
    }

    /// Read the long layout
    pub fn read_tuples<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Vec<TupleRecord>> {
        let mut csv_reader = options.builder().from_reader(reader);

        let headers = csv_reader.headers()?;
        if headers.iter().ne(TUPLE_COLUMNS) {
            return Err(CsvError::Parse {
                line: 1,
                message: format!("expected columns {:?}, found {:?}", TUPLE_COLUMNS, headers),
            });
        }

        csv_reader
            .deserialize()
            .map(|result| result.map_err(CsvError::from))
            .collect()
    }

    fn parse_date(field: &str, line: u64) -> CsvResult<NaiveDate> {
        NaiveDate::parse_from_str(field.trim(), "%Y-%m-%d").map_err(|e| CsvError::Parse {
            line,
            message: format!("invalid date {:?}: {}", field, e),
        })
    }
}
