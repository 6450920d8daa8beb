//! Load, save and batch-convert published sheets

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::manifest::{DateGroup, Manifest, SourceFile};
use agedist_core::{load_grid, LoadOptions, ObservationTable, Sex};
use agedist_csv::{
    output_paths, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter, SavedFiles,
};
use agedist_xlsx::XlsxReader;

/// Rows shown at debug level from each end of a loaded table
const PREVIEW_ROWS: usize = 5;

/// Load the first sheet of a spreadsheet and clean it into a table
pub fn load<P: AsRef<Path>>(
    path: P,
    date: NaiveDate,
    sex: Sex,
    options: &LoadOptions,
) -> Result<ObservationTable> {
    let path = path.as_ref();
    info!("Loading input file {}", path.display());

    let load = || -> Result<ObservationTable> {
        let sheet = XlsxReader::read_sheet_file(path, 0)?;
        debug!(
            "Sheet {:?}: {} rows x {} columns",
            sheet.name,
            sheet.grid.row_count(),
            sheet.grid.column_count()
        );
        Ok(load_grid(&sheet.grid, date, sex, options)?)
    };
    let table = load().map_err(|e| e.in_file(path))?;

    info!(
        "File: {}; Date: {}; Sex: {}; {} rows x {} regions",
        path.display(),
        date,
        sex,
        table.len(),
        table.regions().len()
    );
    preview(&table);

    Ok(table)
}

fn preview(table: &ObservationTable) {
    for row in table.head(PREVIEW_ROWS) {
        debug!("head {} {:?}", row.key, row.values);
    }
    if table.len() > PREVIEW_ROWS {
        for row in table.tail(PREVIEW_ROWS) {
            debug!("tail {} {:?}", row.key, row.values);
        }
    }
}

/// Write `<prefix>_table.csv` and `<prefix>_tuples.csv`
pub fn save<P: AsRef<Path>>(
    prefix: P,
    table: &ObservationTable,
    options: &CsvWriteOptions,
) -> Result<SavedFiles> {
    let prefix = prefix.as_ref();
    CsvWriter::save(prefix, table, options).map_err(|e| Error::from(e).in_file(prefix))
}

/// Verify that the tuples file next to a table file rebuilds the same table.
///
/// Returns the number of tuples read.
pub fn check<P: AsRef<Path>>(prefix: P, options: &CsvReadOptions) -> Result<usize> {
    let paths = output_paths(prefix);

    let table = CsvReader::read_table_file(&paths.table, options)
        .map_err(|e| Error::from(e).in_file(&paths.table))?;
    let tuples = CsvReader::read_tuples_file(&paths.tuples, options)
        .map_err(|e| Error::from(e).in_file(&paths.tuples))?;
    let count = tuples.len();

    // An empty table has no tuples to carry its region list
    let matches = if table.is_empty() {
        tuples.is_empty()
    } else {
        ObservationTable::from_tuples(tuples)
            .map(|rebuilt| rebuilt == table)
            .unwrap_or(false)
    };

    if !matches {
        return Err(Error::Mismatch {
            table: paths.table,
            tuples: paths.tuples,
        });
    }

    info!("{} matches {} ({} tuples)", paths.tuples.display(), paths.table.display(), count);
    Ok(count)
}

/// What a [`Converter::run`] wrote
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Outputs of the individual files, in manifest order
    pub files: Vec<SavedFiles>,
    /// Outputs of the combined per-date tables
    pub combined: Vec<SavedFiles>,
}

/// Batch converter between an input and an output root
#[derive(Debug, Clone)]
pub struct Converter {
    original_root: PathBuf,
    converted_root: PathBuf,
    load_options: LoadOptions,
    write_options: CsvWriteOptions,
}

impl Converter {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(original_root: P, converted_root: Q) -> Self {
        Self {
            original_root: original_root.into(),
            converted_root: converted_root.into(),
            load_options: LoadOptions::default(),
            write_options: CsvWriteOptions::default(),
        }
    }

    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    pub fn with_write_options(mut self, options: CsvWriteOptions) -> Self {
        self.write_options = options;
        self
    }

    /// Convert a single spreadsheet, writing both layouts under `prefix`
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        date: NaiveDate,
        sex: Sex,
        prefix: Q,
    ) -> Result<(ObservationTable, SavedFiles)> {
        let table = load(input, date, sex, &self.load_options)?;

        if let Some(parent) = prefix.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(parent))?;
            }
        }
        let saved = save(prefix, &table, &self.write_options)?;
        Ok((table, saved))
    }

    /// Convert every file of the manifest, then write one combined table per date
    pub fn run(&self, manifest: &Manifest) -> Result<RunSummary> {
        let input_dir = self.original_root.join(&manifest.year_dir);
        let output_dir = self.converted_root.join(&manifest.year_dir);
        fs::create_dir_all(&output_dir).map_err(|e| Error::from(e).in_file(&output_dir))?;

        let mut summary = RunSummary::default();
        for group in &manifest.groups {
            let combined = self.run_group(group, &input_dir, &output_dir, &mut summary)?;
            summary.combined.push(combined);
        }

        info!(
            "Converted {} files into {} combined tables",
            summary.files.len(),
            summary.combined.len()
        );
        Ok(summary)
    }

    fn run_group(
        &self,
        group: &DateGroup,
        input_dir: &Path,
        output_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<SavedFiles> {
        let mut tables = Vec::with_capacity(group.files.len());
        for file in &group.files {
            let (table, saved) = self.convert_source(file, input_dir, output_dir)?;
            summary.files.push(saved);
            tables.push(table);
        }

        let prefix = output_dir.join(group.output_stem());
        let combined = ObservationTable::concat(tables).map_err(|e| Error::from(e).in_file(&prefix))?;
        info!(
            "Combined {}: {} rows x {} regions",
            group.date,
            combined.len(),
            combined.regions().len()
        );
        save(prefix, &combined, &self.write_options)
    }

    fn convert_source(
        &self,
        file: &SourceFile,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(ObservationTable, SavedFiles)> {
        let input = input_dir.join(file.file_name());
        let table = load(input, file.date, file.sex, &self.load_options)?;
        let saved = save(output_dir.join(&file.id), &table, &self.write_options)?;
        Ok((table, saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agedist_core::RowKey;
    use pretty_assertions::assert_eq;

    fn table(regions: &[&str], rows: &[(&str, &[u64])]) -> ObservationTable {
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let mut table =
            ObservationTable::new(regions.iter().map(|r| r.to_string()).collect()).unwrap();
        for (age, values) in rows {
            table
                .push(RowKey::new(date, Sex::Both, *age), values.to_vec())
                .unwrap();
        }
        table
    }

    #[test]
    fn test_check_accepts_saved_table() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sample");
        let table = table(&["CZ010", "CZ020"], &[("0", &[10, 20]), ("1", &[11, 21])]);

        save(&prefix, &table, &CsvWriteOptions::default()).unwrap();

        assert_eq!(check(&prefix, &CsvReadOptions::default()).unwrap(), 4);
    }

    #[test]
    fn test_check_accepts_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("empty");

        save(&prefix, &table(&["CZ010"], &[]), &CsvWriteOptions::default()).unwrap();

        assert_eq!(check(&prefix, &CsvReadOptions::default()).unwrap(), 0);
    }

    #[test]
    fn test_check_detects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sample");
        let original = table(&["CZ010"], &[("0", &[10]), ("1", &[11])]);
        let altered = table(&["CZ010"], &[("0", &[10]), ("1", &[12])]);

        let paths = save(&prefix, &original, &CsvWriteOptions::default()).unwrap();
        CsvWriter::write_tuples(
            &altered,
            fs::File::create(&paths.tuples).unwrap(),
            &CsvWriteOptions::default(),
        )
        .unwrap();

        let result = check(&prefix, &CsvReadOptions::default());
        assert!(matches!(result, Err(Error::Mismatch { .. })));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("1300642001.xlsx");
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();

        let err = load(&missing, date, Sex::Both, &LoadOptions::default()).unwrap_err();

        match &err {
            Error::File { path, .. } => assert_eq!(path, &missing),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("1300642001.xlsx"));
    }
}
