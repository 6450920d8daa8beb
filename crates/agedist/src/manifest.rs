//! Which published files to convert, and under which date and sex

use chrono::NaiveDate;

use agedist_core::Sex;

/// One published spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Publication identifier, also the file stem (e.g. `1300642001`)
    pub id: String,
    /// Reference date
    pub date: NaiveDate,
    /// Sex category
    pub sex: Sex,
}

impl SourceFile {
    pub fn new<S: Into<String>>(id: S, date: NaiveDate, sex: Sex) -> Self {
        Self {
            id: id.into(),
            date,
            sex,
        }
    }

    /// Spreadsheet file name
    pub fn file_name(&self) -> String {
        format!("{}.xlsx", self.id)
    }
}

/// Files sharing a reference date; their tables are also written combined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub files: Vec<SourceFile>,
}

impl DateGroup {
    /// Output prefix of the combined table, `YYYY_MM_DD`
    pub fn output_stem(&self) -> String {
        self.date.format("%Y_%m_%d").to_string()
    }
}

/// Conversions to run, relative to a year directory under the input and
/// output roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Subdirectory under both roots (e.g. `2019`)
    pub year_dir: String,
    pub groups: Vec<DateGroup>,
}

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

/// 2019 releases of the age distribution tables, file ids in B, M, F order
const RELEASES_2019: [(NaiveDate, [&str; 3]); 3] = [
    (ymd(2019, 1, 1), ["1300642001", "1300642002", "1300642003"]),
    (ymd(2019, 7, 1), ["1300642004", "1300642005", "1300642006"]),
    (ymd(2019, 12, 31), ["1300642007", "1300642008", "1300642009"]),
];

impl Manifest {
    /// The nine 2019 files: three dates, each published for B, M and F
    pub fn default_2019() -> Self {
        let groups = RELEASES_2019
            .iter()
            .map(|(date, ids)| DateGroup {
                date: *date,
                files: ids
                    .iter()
                    .zip(Sex::ALL)
                    .map(|(id, sex)| SourceFile::new(*id, *date, sex))
                    .collect(),
            })
            .collect();

        Self {
            year_dir: "2019".to_string(),
            groups,
        }
    }

    /// Every file, in processing order
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.groups.iter().flat_map(|group| group.files.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_2019() {
        let manifest = Manifest::default_2019();

        assert_eq!(manifest.year_dir, "2019");
        assert_eq!(manifest.groups.len(), 3);
        assert_eq!(manifest.files().count(), 9);

        let first = &manifest.groups[0];
        assert_eq!(first.output_stem(), "2019_01_01");
        assert_eq!(
            first.files[1],
            SourceFile::new("1300642002", ymd(2019, 1, 1), Sex::Male)
        );

        let last = manifest.files().last().unwrap();
        assert_eq!(last.file_name(), "1300642009.xlsx");
        assert_eq!(last.date, ymd(2019, 12, 31));
        assert_eq!(last.sex, Sex::Female);
    }

    #[test]
    fn test_group_sexes_in_publication_order() {
        for group in Manifest::default_2019().groups {
            let sexes: Vec<_> = group.files.iter().map(|f| f.sex).collect();
            assert_eq!(sexes, Sex::ALL.to_vec());
            assert!(group.files.iter().all(|f| f.date == group.date));
        }
    }
}
