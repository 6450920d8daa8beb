//! Error types for agedist-core

use chrono::NaiveDate;
use thiserror::Error;

use crate::header::HeaderError;
use crate::sex::Sex;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while cleaning and combining observation tables
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    /// The sheet has fewer rows than the configured header offset
    #[error("Header row {0} not found in sheet")]
    MissingHeaderRow(usize),

    /// A header cell between two named columns is empty
    #[error("Empty header in column {column}")]
    EmptyHeader { column: String },

    /// A region header could not be split into code and name
    #[error("Malformed header in column {column} ({header:?}): {source}")]
    MalformedHeader {
        column: String,
        header: String,
        #[source]
        source: HeaderError,
    },

    /// No header matched the age-category label
    #[error("Age column {0:?} not found in header")]
    MissingAgeColumn(String),

    /// The header has an age column but no region columns
    #[error("No region columns in header row {0}")]
    NoRegionColumns(usize),

    /// Two columns resolved to the same key
    #[error("Duplicate column key: {0}")]
    DuplicateRegion(String),

    /// The first data row does not carry the expected total label
    #[error("Row {row}: expected a total row labelled {expected:?}, found {found:?}")]
    UnexpectedTotalRow {
        row: usize,
        expected: String,
        found: String,
    },

    /// A data cell is not a non-negative integer
    #[error("Row {row}, column {column}: {value:?} is not a non-negative integer")]
    NotAnInteger {
        row: usize,
        column: String,
        value: String,
    },

    /// A row does not carry exactly one value per region
    #[error("Row {key} has {actual} values, expected {expected}")]
    RowWidth {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// Two rows share the same `(date, sex, age)` key
    #[error("Duplicate row key: {0}")]
    DuplicateKey(String),

    /// Tables being concatenated have different region columns
    #[error("Region columns differ: expected {expected:?}, found {found:?}")]
    RegionMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Sex partitions of one date have different age categories
    #[error("Age categories for {date} sex {sex} differ from sex {reference}")]
    AgeMismatch {
        date: NaiveDate,
        sex: Sex,
        reference: Sex,
    },

    /// A tuple set leaves a `(key, region)` combination without a value
    #[error("No population for row {key}, region {region}")]
    MissingTuple { key: String, region: String },

    /// Unknown sex tag
    #[error("Invalid sex category: {0:?} (expected B, M or F)")]
    InvalidSex(String),
}
