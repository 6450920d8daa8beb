//! # agedist-core
//!
//! Core data structures for converting population-by-age spreadsheets.
//!
//! This crate provides the types shared by the reader, the writer and the
//! conversion pipeline:
//! - [`CellValue`] and [`Grid`] - raw worksheet contents as read from a file
//! - [`Sex`] - the B/M/F category a table is published for
//! - [`ObservationTable`] - wide table keyed by `(date, sex, age)`, one column per region
//! - [`TupleRecord`] - long-form flattening of an observation table
//! - [`loader::load_grid`] - the cleaning rules that turn a grid into a table
//!
//! ## Example
//!
//! ```rust
//! use agedist_core::{CellValue, Grid, LoadOptions, Sex};
//! use chrono::NaiveDate;
//!
//! let mut grid = Grid::new();
//! grid.set(2, 0, CellValue::string("Věk"));
//! grid.set(2, 1, CellValue::string("CZ010\nHlavní město Praha"));
//! grid.set(3, 0, CellValue::string("Celkem"));
//! grid.set(3, 1, CellValue::Number(1_324_277.0));
//! grid.set(4, 0, CellValue::string("0"));
//! grid.set(4, 1, CellValue::Number(14_212.0));
//!
//! let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
//! let table = agedist_core::load_grid(&grid, date, Sex::Both, &LoadOptions::default()).unwrap();
//!
//! assert_eq!(table.regions(), ["CZ010"]);
//! assert_eq!(table.len(), 1);
//! ```

pub mod cell;
pub mod error;
pub mod header;
pub mod loader;
pub mod sex;
pub mod table;

// Re-exports for convenience
pub use cell::{CellAddress, CellValue, Grid};
pub use error::{Error, Result};
pub use header::{parse_region_header, HeaderError, RegionHeader};
pub use loader::{load_grid, HeaderPolicy, LoadOptions};
pub use sex::Sex;
pub use table::{Observation, ObservationTable, RowKey, TupleRecord};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Column key the age-category header is renamed to
pub const AGE_COLUMN: &str = "age";
