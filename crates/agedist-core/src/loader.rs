//! Cleaning rules that turn a raw worksheet grid into an observation table
//!
//! The published sheets look like this (0-based rows):
//!
//! ```text
//! 0   title
//! 1   subtitle / blank
//! 2   Věk | CZ0\nČesko | CZ010\nHlavní město Praha | ...   <- header
//! 3   (units row with blanks)                             <- dropped: missing values
//! 4   Celkem | 10 649 800 | 1 324 277 | ...                <- dropped: total
//! 5   0 | 112 231 | 14 212 | ...
//! ... one row per age category
//! n   Average age | 42,5 | ...                            <- dropped: average
//! n+1 footnote                                             <- dropped: missing values
//! ```

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::cell::{CellAddress, CellValue, Grid};
use crate::error::{Error, Result};
use crate::header::{parse_region_header, whole_text_header};
use crate::sex::Sex;
use crate::table::{ObservationTable, RowKey};
use crate::AGE_COLUMN;

/// Row index (0-based) of the header in published sheets
pub const DEFAULT_HEADER_ROW: usize = 2;

/// Header text of the age-category column
pub const DEFAULT_AGE_HEADER: &str = "Věk";

/// Substring marking the precomputed mean row
pub const DEFAULT_AVERAGE_MARKER: &str = "Average";

/// What to do with a region header that does not split into code and name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Fail the load
    #[default]
    Strict,
    /// Use the whole header text as the region code
    Lenient,
}

/// Options controlling how a sheet is cleaned
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Row index (0-based) holding the column headers
    pub header_row: usize,
    /// Header of the age-category column, renamed to `age`
    pub age_header: String,
    /// Rows whose age text contains this are dropped
    pub average_marker: String,
    /// Handling of malformed region headers
    pub header_policy: HeaderPolicy,
    /// When set, the dropped total row must carry this label
    pub total_label: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header_row: DEFAULT_HEADER_ROW,
            age_header: DEFAULT_AGE_HEADER.to_string(),
            average_marker: DEFAULT_AVERAGE_MARKER.to_string(),
            header_policy: HeaderPolicy::Strict,
            total_label: None,
        }
    }
}

/// Source column positions of the age column and each region
#[derive(Debug)]
struct ColumnLayout {
    age: usize,
    regions: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.age).chain(self.regions.iter().map(|(col, _)| *col))
    }
}

/// Clean one published sheet into an observation table.
///
/// Steps, in order:
/// 1. read the header at `options.header_row`, rename the age column and map
///    every other column to its region code
/// 2. drop data rows with a missing value in any column
/// 3. drop the first remaining row (the total) and rows whose age contains
///    `options.average_marker`
/// 4. key every row by `(date, sex, age)` and coerce counts to integers
pub fn load_grid(
    grid: &Grid,
    date: NaiveDate,
    sex: Sex,
    options: &LoadOptions,
) -> Result<ObservationTable> {
    let header = grid
        .row(options.header_row)
        .ok_or(Error::MissingHeaderRow(options.header_row))?;
    let layout = resolve_columns(header, options)?;

    let complete: Vec<usize> = (options.header_row + 1..grid.row_count())
        .filter(|&row| layout.columns().all(|col| !grid.get(row, col).is_missing()))
        .collect();

    debug!(
        "{} of {} data rows complete",
        complete.len(),
        grid.row_count().saturating_sub(options.header_row + 1)
    );

    let mut rows = complete.into_iter();
    if let Some(total_row) = rows.next() {
        let label = grid.get(total_row, layout.age).to_text();
        if let Some(expected) = &options.total_label {
            if !label.contains(expected.as_str()) {
                return Err(Error::UnexpectedTotalRow {
                    row: total_row + 1,
                    expected: expected.clone(),
                    found: label,
                });
            }
        }
        debug!("Dropping total row {} ({:?})", total_row + 1, label);
    }

    let regions = layout.regions.iter().map(|(_, code)| code.clone()).collect();
    let mut table = ObservationTable::new(regions)?;

    for row in rows {
        let age = grid.get(row, layout.age).to_text();
        if age.contains(options.average_marker.as_str()) {
            debug!("Dropping average row {} ({:?})", row + 1, age);
            continue;
        }

        let values = layout
            .regions
            .iter()
            .map(|(col, code)| {
                let cell = grid.get(row, *col);
                coerce_count(cell).ok_or_else(|| Error::NotAnInteger {
                    row: row + 1,
                    column: code.clone(),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        table.push(RowKey::new(date, sex, age), values)?;
    }

    Ok(table)
}

fn resolve_columns(header: &[CellValue], options: &LoadOptions) -> Result<ColumnLayout> {
    let used = header
        .iter()
        .rposition(|cell| !cell.is_missing())
        .map_or(0, |last| last + 1);

    let mut age = None;
    let mut regions: Vec<(usize, String)> = Vec::new();

    for (col, cell) in header[..used].iter().enumerate() {
        let letters = CellAddress::column_to_letters(col as u16);
        if cell.is_missing() {
            return Err(Error::EmptyHeader { column: letters });
        }

        let raw = cell.to_string();
        if raw.trim() == options.age_header {
            if age.replace(col).is_some() {
                return Err(Error::DuplicateRegion(AGE_COLUMN.to_string()));
            }
            continue;
        }

        let region = match parse_region_header(&raw) {
            Ok(region) => region,
            Err(source) => match options.header_policy {
                HeaderPolicy::Strict => {
                    return Err(Error::MalformedHeader {
                        column: letters,
                        header: raw,
                        source,
                    })
                }
                HeaderPolicy::Lenient => {
                    warn!("Column {letters}: {source}; using {:?} as region code", raw.trim());
                    whole_text_header(&raw)
                }
            },
        };

        if region.code == AGE_COLUMN || regions.iter().any(|(_, code)| *code == region.code) {
            return Err(Error::DuplicateRegion(region.code));
        }
        regions.push((col, region.code));
    }

    let age = age.ok_or_else(|| Error::MissingAgeColumn(options.age_header.clone()))?;
    if regions.is_empty() {
        return Err(Error::NoRegionColumns(options.header_row + 1));
    }
    Ok(ColumnLayout { age, regions })
}

/// Coerce a cell to a non-negative integer count.
///
/// Numbers must be finite, non-negative and integral. Strings must be decimal
/// digits, optionally grouped with spaces, no-break spaces or narrow no-break
/// spaces. Everything else is rejected rather than truncated.
pub fn coerce_count(cell: &CellValue) -> Option<u64> {
    match cell {
        CellValue::Number(n) => {
            if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n < u64::MAX as f64 {
                Some(*n as u64)
            } else {
                None
            }
        }
        CellValue::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
                .collect();
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.parse().ok()
            } else {
                None
            }
        }
        CellValue::Empty | CellValue::Boolean(_) | CellValue::Error(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
    }

    fn s(text: &str) -> CellValue {
        CellValue::string(text)
    }

    fn n(value: f64) -> CellValue {
        CellValue::Number(value)
    }

    /// Title rows, header at offset 2, a units row, a total, three ages, an
    /// average row and a footnote.
    fn published_sheet() -> Grid {
        Grid::from_rows(vec![
            vec![s("Age distribution of the population")],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague"), s("CZ020\nCentral")],
            vec![CellValue::Empty, s("persons"), CellValue::Empty],
            vec![s("Total"), n(300.0), n(330.0)],
            vec![n(0.0), n(100.0), n(110.0)],
            vec![n(1.0), n(120.0), n(130.0)],
            vec![s("100+"), n(80.0), n(90.0)],
            vec![s("Average age"), n(41.7), n(42.1)],
            vec![s("Source: CZSO")],
        ])
    }

    #[test]
    fn test_published_sheet() {
        let table = load_grid(&published_sheet(), date(), Sex::Both, &LoadOptions::default())
            .unwrap();

        assert_eq!(table.regions(), ["CZ010", "CZ020"]);
        let ages: Vec<_> = table.rows().iter().map(|r| r.key.age.as_str()).collect();
        assert_eq!(ages, vec!["0", "1", "100+"]);

        let key = RowKey::new(date(), Sex::Both, "1");
        assert_eq!(table.get(&key, "CZ020"), Some(130));
        assert!(table.rows().iter().all(|r| r.key.sex == Sex::Both));
    }

    #[test]
    fn test_row_count_is_input_minus_total_and_average() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague"), s("CZ020\nCentral")],
            vec![s("Total"), n(30.0), n(33.0)],
            vec![s("0"), n(10.0), n(11.0)],
            vec![s("1"), n(20.0), n(22.0)],
            vec![s("Average"), n(0.5), n(0.5)],
        ]);

        let table = load_grid(&grid, date(), Sex::Male, &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 4 - 2);
        assert!(table
            .rows()
            .iter()
            .all(|r| r.key.age != "Total" && !r.key.age.contains("Average")));
    }

    #[test]
    fn test_header_only_sheet() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague")],
        ]);
        let table = load_grid(&grid, date(), Sex::Both, &LoadOptions::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.regions(), ["CZ010"]);
    }

    #[test]
    fn test_missing_header_row() {
        let grid = Grid::from_rows(vec![vec![s("title")]]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        assert!(matches!(result, Err(Error::MissingHeaderRow(2))));
    }

    #[test]
    fn test_missing_age_column() {
        let grid = Grid::from_rows(vec![vec![], vec![], vec![s("CZ010\nPrague")]]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        assert!(matches!(result, Err(Error::MissingAgeColumn(h)) if h == "Věk"));
    }

    #[test]
    fn test_age_column_alone_is_rejected() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk")],
            vec![s("Total")],
            vec![s("0")],
            vec![s("1")],
        ]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        assert!(matches!(result, Err(Error::NoRegionColumns(3))));
    }

    #[test]
    fn test_malformed_header_strict() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague"), s("CZ020 Central")],
        ]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        match result {
            Err(Error::MalformedHeader { column, header, .. }) => {
                assert_eq!(column, "C");
                assert_eq!(header, "CZ020 Central");
            }
            other => panic!("expected MalformedHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_header_lenient() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ0")],
            vec![s("Total"), n(5.0)],
            vec![s("0"), n(5.0)],
        ]);
        let options = LoadOptions {
            header_policy: HeaderPolicy::Lenient,
            ..LoadOptions::default()
        };
        let table = load_grid(&grid, date(), Sex::Both, &options).unwrap();
        assert_eq!(table.regions(), ["CZ0"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_interior_empty_header() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), CellValue::Empty, s("CZ020\nCentral")],
        ]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        assert!(matches!(result, Err(Error::EmptyHeader { column }) if column == "B"));
    }

    #[test]
    fn test_trailing_empty_headers_ignored() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague"), CellValue::Empty, s(" ")],
            vec![s("Total"), n(5.0), s("note")],
            vec![s("0"), n(5.0)],
        ]);
        let table = load_grid(&grid, date(), Sex::Both, &LoadOptions::default()).unwrap();
        assert_eq!(table.regions(), ["CZ010"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_region_code() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague"), s("CZ010\nPraha")],
        ]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        assert!(matches!(result, Err(Error::DuplicateRegion(code)) if code == "CZ010"));
    }

    #[test]
    fn test_total_label_validation() {
        let options = LoadOptions {
            total_label: Some("Total".into()),
            ..LoadOptions::default()
        };
        assert!(load_grid(&published_sheet(), date(), Sex::Both, &options).is_ok());

        let options = LoadOptions {
            total_label: Some("Celkem".into()),
            ..LoadOptions::default()
        };
        let result = load_grid(&published_sheet(), date(), Sex::Both, &options);
        match result {
            Err(Error::UnexpectedTotalRow { row, found, .. }) => {
                assert_eq!(row, 5);
                assert_eq!(found, "Total");
            }
            other => panic!("expected UnexpectedTotalRow, got {other:?}"),
        }
    }

    #[test]
    fn test_fractional_count_fails() {
        let grid = Grid::from_rows(vec![
            vec![],
            vec![],
            vec![s("Věk"), s("CZ010\nPrague")],
            vec![s("Total"), n(5.0)],
            vec![s("0"), n(2.5)],
        ]);
        let result = load_grid(&grid, date(), Sex::Both, &LoadOptions::default());
        match result {
            Err(Error::NotAnInteger { row, column, value }) => {
                assert_eq!(row, 5);
                assert_eq!(column, "CZ010");
                assert_eq!(value, "2.5");
            }
            other => panic!("expected NotAnInteger, got {other:?}"),
        }
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(&n(0.0)), Some(0));
        assert_eq!(coerce_count(&n(1_324_277.0)), Some(1_324_277));
        assert_eq!(coerce_count(&s("1 324 277")), Some(1_324_277));
        assert_eq!(coerce_count(&s("10\u{a0}649\u{a0}800")), Some(10_649_800));
        assert_eq!(coerce_count(&s(" 42 ")), Some(42));

        assert_eq!(coerce_count(&n(-1.0)), None);
        assert_eq!(coerce_count(&n(0.5)), None);
        assert_eq!(coerce_count(&n(f64::NAN)), None);
        assert_eq!(coerce_count(&n(f64::INFINITY)), None);
        assert_eq!(coerce_count(&s("12.0")), None);
        assert_eq!(coerce_count(&s("-3")), None);
        assert_eq!(coerce_count(&s("x")), None);
        assert_eq!(coerce_count(&s("")), None);
        assert_eq!(coerce_count(&CellValue::Boolean(true)), None);
    }
}
