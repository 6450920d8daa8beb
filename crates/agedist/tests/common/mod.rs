//! Spreadsheet fixtures shaped like the published age distribution tables

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use agedist::{Manifest, Sex};

pub const REGIONS: [(&str, &str); 3] = [
    ("CZ010", "Hlavní město Praha"),
    ("CZ020", "Středočeský kraj"),
    ("CZ031", "Jihočeský kraj"),
];

pub const AGES: [&str; 4] = ["0", "1", "2", "100+"];

#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Number(n as f64)
    }
}

/// Population of `AGES[age]` in `REGIONS[region]`
pub fn count(sex: Sex, age: usize, region: usize) -> u64 {
    let male = 1_000 * (region as u64 + 1) + 10 * age as u64;
    let female = male + 7;
    match sex {
        Sex::Male => male,
        Sex::Female => female,
        Sex::Both => male + female,
    }
}

/// Title, blank row, header, total, ages, average, footnote
pub fn population_rows(sex: Sex) -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![Cell::from("Obyvatelstvo podle věku k 1. 1. 2019")], vec![]];

    let mut header = vec![Cell::from("Věk")];
    header.extend(
        REGIONS
            .iter()
            .map(|(code, name)| Cell::Text(format!("{code}\n{name}"))),
    );
    rows.push(header);

    let mut total = vec![Cell::from("Celkem")];
    total.extend((0..REGIONS.len()).map(|r| {
        Cell::from((0..AGES.len()).map(|a| count(sex, a, r)).sum::<u64>())
    }));
    rows.push(total);

    for (a, age) in AGES.iter().enumerate() {
        let label = match age.parse::<u64>() {
            Ok(n) => Cell::from(n),
            Err(_) => Cell::from(*age),
        };
        let mut row = vec![label];
        row.extend((0..REGIONS.len()).map(|r| Cell::from(count(sex, a, r))));
        rows.push(row);
    }

    let mut average = vec![Cell::from("Průměrný věk / Average age")];
    average.extend((0..REGIONS.len()).map(|r| Cell::Number(41.5 + r as f64)));
    rows.push(average);

    rows.push(vec![Cell::from("Zdroj: ČSÚ")]);
    rows
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn column_letter(col: usize) -> char {
    (b'A' + col as u8) as char
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), r + 1);
            match cell {
                Cell::Text(text) => xml.push_str(&format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(text)
                )),
                Cell::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#))
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Write a single-sheet workbook
pub fn write_workbook(path: &Path, rows: &[Vec<Cell>]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#).unwrap();

    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="List1" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();

    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();

    zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
    zip.write_all(sheet_xml(rows).as_bytes()).unwrap();

    zip.finish().unwrap();
}

/// Write every input of `manifest` under `<root>/<year>/`
pub fn write_inputs(root: &Path, manifest: &Manifest) {
    let dir = root.join(&manifest.year_dir);
    fs::create_dir_all(&dir).unwrap();
    for file in manifest.files() {
        write_workbook(&dir.join(file.file_name()), &population_rows(file.sex));
    }
}
