//! # agedist-xlsx
//!
//! Minimal XLSX (Office Open XML) reader. Worksheets are read into an
//! [`agedist_core::Grid`] of cell values; styles, formulas and other
//! workbook features are ignored.

pub mod error;
pub mod reader;

pub use error::{XlsxError, XlsxResult};
pub use reader::{Sheet, XlsxReader};
