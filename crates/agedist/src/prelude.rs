//! Common imports
//!
//! ```rust
//! use agedist::prelude::*;
//! ```

pub use crate::{
    Converter,
    CsvReadOptions,
    CsvWriteOptions,
    Error,
    HeaderPolicy,
    LoadOptions,
    Manifest,
    ObservationTable,
    Result,
    RowKey,
    Sex,
    TupleRecord,
};
