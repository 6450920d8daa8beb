//! Observation tables and their long-form tuple flattening

use std::fmt;

use ahash::AHashMap;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::sex::Sex;

/// Row key of an observation table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    /// Reference date of the census
    pub date: NaiveDate,
    /// Sex category
    pub sex: Sex,
    /// Age category label as published (e.g. `"0"`, `"100+"`)
    pub age: String,
}

impl RowKey {
    pub fn new<S: Into<String>>(date: NaiveDate, sex: Sex, age: S) -> Self {
        Self {
            date,
            sex,
            age: age.into(),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.date, self.sex, self.age)
    }
}

/// One row of an observation table: a key and one count per region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub key: RowKey,
    /// Population counts, in the table's region order
    pub values: Vec<u64>,
}

/// One cell of an observation table in long form
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TupleRecord {
    pub date: NaiveDate,
    pub sex: Sex,
    pub age: String,
    pub region: String,
    pub population: u64,
}

impl TupleRecord {
    /// Row key this tuple belongs to
    pub fn key(&self) -> RowKey {
        RowKey::new(self.date, self.sex, self.age.clone())
    }
}

/// Wide-form table keyed by `(date, sex, age)` with one column per region.
///
/// Rows keep insertion order, keys are unique and every row has exactly one
/// value per region.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    regions: Vec<String>,
    rows: Vec<Observation>,
    index: AHashMap<RowKey, usize>,
}

impl PartialEq for ObservationTable {
    fn eq(&self, other: &Self) -> bool {
        self.regions == other.regions && self.rows == other.rows
    }
}

impl Eq for ObservationTable {}

impl ObservationTable {
    /// Create an empty table with the given region columns
    pub fn new(regions: Vec<String>) -> Result<Self> {
        let mut seen = AHashMap::with_capacity(regions.len());
        for region in &regions {
            if seen.insert(region.as_str(), ()).is_some() {
                return Err(Error::DuplicateRegion(region.clone()));
            }
        }

        Ok(Self {
            regions,
            rows: Vec::new(),
            index: AHashMap::new(),
        })
    }

    /// Append a row
    pub fn push(&mut self, key: RowKey, values: Vec<u64>) -> Result<()> {
        if values.len() != self.regions.len() {
            return Err(Error::RowWidth {
                key: key.to_string(),
                expected: self.regions.len(),
                actual: values.len(),
            });
        }
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }

        self.index.insert(key.clone(), self.rows.len());
        self.rows.push(Observation { key, values });
        Ok(())
    }

    /// Region codes, in column order
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Rows, in insertion order
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column position of a region
    pub fn region_index(&self, region: &str) -> Option<usize> {
        self.regions.iter().position(|r| r == region)
    }

    /// Look up a row by key
    pub fn row(&self, key: &RowKey) -> Option<&Observation> {
        self.index.get(key).map(|&idx| &self.rows[idx])
    }

    /// Look up one cell
    pub fn get(&self, key: &RowKey, region: &str) -> Option<u64> {
        let col = self.region_index(region)?;
        self.row(key).map(|row| row.values[col])
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> &[Observation] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Last `n` rows
    pub fn tail(&self, n: usize) -> &[Observation] {
        &self.rows[self.rows.len() - n.min(self.rows.len())..]
    }

    /// Concatenate tables row-wise, in iteration order.
    ///
    /// All tables must have the same region columns in the same order, keys
    /// must not collide, and every sex partition of a date must list the same
    /// age categories.
    pub fn concat<I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = ObservationTable>,
    {
        let mut tables = tables.into_iter();
        let mut combined = match tables.next() {
            Some(first) => first,
            None => return Ok(Self::default()),
        };

        for table in tables {
            if table.regions != combined.regions {
                return Err(Error::RegionMismatch {
                    expected: combined.regions.clone(),
                    found: table.regions,
                });
            }
            for row in table.rows {
                combined.push(row.key, row.values)?;
            }
        }

        combined.check_age_sets()?;
        Ok(combined)
    }

    fn check_age_sets(&self) -> Result<()> {
        let mut order: Vec<(NaiveDate, Sex)> = Vec::new();
        let mut ages: AHashMap<(NaiveDate, Sex), Vec<&str>> = AHashMap::new();
        for row in &self.rows {
            let group = (row.key.date, row.key.sex);
            ages.entry(group)
                .or_insert_with(|| {
                    order.push(group);
                    Vec::new()
                })
                .push(row.key.age.as_str());
        }
        for list in ages.values_mut() {
            list.sort_unstable();
        }

        let mut reference: AHashMap<NaiveDate, Sex> = AHashMap::new();
        for (date, sex) in order {
            match reference.get(&date) {
                Some(&ref_sex) => {
                    if ages.get(&(date, sex)) != ages.get(&(date, ref_sex)) {
                        return Err(Error::AgeMismatch {
                            date,
                            sex,
                            reference: ref_sex,
                        });
                    }
                }
                None => {
                    reference.insert(date, sex);
                }
            }
        }
        Ok(())
    }

    /// Flatten into long form, one tuple per cell.
    ///
    /// Emission is column-major: every row of the first region, then every
    /// row of the second region, and so on.
    pub fn tuples(&self) -> impl Iterator<Item = TupleRecord> + '_ {
        self.regions
            .iter()
            .enumerate()
            .flat_map(move |(col, region)| {
                self.rows.iter().map(move |row| TupleRecord {
                    date: row.key.date,
                    sex: row.key.sex,
                    age: row.key.age.clone(),
                    region: region.clone(),
                    population: row.values[col],
                })
            })
    }

    /// Rebuild a wide table from tuples.
    ///
    /// Regions and row keys are ordered by first appearance, so the output of
    /// [`ObservationTable::tuples`] reproduces the original table. Every
    /// `(key, region)` combination must appear exactly once. A table without
    /// regions or without rows has no tuples and rebuilds as an empty table.
    pub fn from_tuples<I>(tuples: I) -> Result<Self>
    where
        I: IntoIterator<Item = TupleRecord>,
    {
        let mut regions: Vec<String> = Vec::new();
        let mut region_pos: AHashMap<String, usize> = AHashMap::new();
        let mut keys: Vec<RowKey> = Vec::new();
        let mut key_pos: AHashMap<RowKey, usize> = AHashMap::new();
        let mut cells: AHashMap<(usize, usize), u64> = AHashMap::new();

        for tuple in tuples {
            let col = match region_pos.get(&tuple.region) {
                Some(&col) => col,
                None => {
                    region_pos.insert(tuple.region.clone(), regions.len());
                    regions.push(tuple.region.clone());
                    regions.len() - 1
                }
            };

            let key = tuple.key();
            let row = match key_pos.get(&key) {
                Some(&row) => row,
                None => {
                    key_pos.insert(key.clone(), keys.len());
                    keys.push(key.clone());
                    keys.len() - 1
                }
            };

            if cells.insert((row, col), tuple.population).is_some() {
                return Err(Error::DuplicateKey(format!("{} {}", key, tuple.region)));
            }
        }

        let mut table = Self::new(regions)?;
        for (row, key) in keys.into_iter().enumerate() {
            let values = table
                .regions
                .iter()
                .enumerate()
                .map(|(col, region)| {
                    cells
                        .get(&(row, col))
                        .copied()
                        .ok_or_else(|| Error::MissingTuple {
                            key: key.to_string(),
                            region: region.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            table.push(key, values)?;
        }
        Ok(table)
    }
}
