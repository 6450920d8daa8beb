//! # agedist-csv
//!
//! CSV layouts for observation tables:
//!
//! - `<prefix>_table.csv`: `date,sex,age,<region…>`, one row per observation
//! - `<prefix>_tuples.csv`: `date,sex,age,region,population`, one row per cell

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::{output_paths, CsvWriter, SavedFiles};

/// Key columns leading both layouts
pub const KEY_COLUMNS: [&str; 3] = ["date", "sex", "age"];

/// Header of the tuples layout
pub const TUPLE_COLUMNS: [&str; 5] = ["date", "sex", "age", "region", "population"];
