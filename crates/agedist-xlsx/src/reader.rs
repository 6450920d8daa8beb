//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::{XlsxError, XlsxResult};
use agedist_core::{CellAddress, CellValue, Grid, MAX_ROWS};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format for characters XML cannot carry literally, most
/// commonly `_x000a_` for a line break inside a cell. `_x005f_` is an escaped
/// underscore. Anything that is not a complete escape is copied through.
fn decode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match decode_escape(candidate) {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decode a single `_xHHHH_` at the start of `s`
fn decode_escape(s: &str) -> Option<char> {
    let hex = s.get(2..6)?;
    if s.as_bytes().get(6) != Some(&b'_') || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Value of an attribute, unescaped
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// A worksheet read into a grid
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name as shown on the tab
    pub name: String,
    /// Cell values
    pub grid: Grid,
}

/// Cell collected between `<c>` and `</c>`
#[derive(Debug)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    text: String,
}

/// An opened workbook: archive, shared strings and sheet locations
struct Workbook<R> {
    archive: zip::ZipArchive<R>,
    shared_strings: Vec<String>,
    /// (name, part path) in workbook order
    sheets: Vec<(String, String)>,
}

impl<R: Read + Seek> Workbook<R> {
    fn open(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = XlsxReader::read_shared_strings(&mut archive)?;
        let sheet_info = XlsxReader::read_workbook_xml(&mut archive)?;
        let sheet_paths = XlsxReader::read_workbook_rels(&mut archive)?;

        let sheets = sheet_info
            .into_iter()
            .filter_map(|(name, r_id)| sheet_paths.get(&r_id).map(|path| (name, path.clone())))
            .collect();

        Ok(Self {
            archive,
            shared_strings,
            sheets,
        })
    }

    fn sheet(&mut self, index: usize) -> XlsxResult<Sheet> {
        let (name, path) = self
            .sheets
            .get(index)
            .cloned()
            .ok_or(XlsxError::SheetOutOfBounds(index, self.sheets.len()))?;

        let grid = XlsxReader::read_worksheet(&mut self.archive, &path, &self.shared_strings)?;
        debug!(
            "Read sheet {:?}: {} rows x {} columns",
            name,
            grid.row_count(),
            grid.column_count()
        );
        Ok(Sheet { name, grid })
    }
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read every worksheet of a file
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Vec<Sheet>> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read one worksheet of a file by 0-based index
    pub fn read_sheet_file<P: AsRef<Path>>(path: P, index: usize) -> XlsxResult<Sheet> {
        let file = File::open(path)?;
        Self::read_sheet(BufReader::new(file), index)
    }

    /// Read every worksheet from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Vec<Sheet>> {
        let mut workbook = Workbook::open(reader)?;
        (0..workbook.sheets.len())
            .map(|idx| workbook.sheet(idx))
            .collect()
    }

    /// Read one worksheet from a reader by 0-based index
    pub fn read_sheet<R: Read + Seek>(reader: R, index: usize) -> XlsxResult<Sheet> {
        Workbook::open(reader)?.sheet(index)
    }

    /// List worksheet names in workbook order
    pub fn sheet_names<R: Read + Seek>(reader: R) -> XlsxResult<Vec<String>> {
        let workbook = Workbook::open(reader)?;
        Ok(workbook.sheets.into_iter().map(|(name, _)| name).collect())
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(Vec::new()), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        let mut buf = Vec::new();
        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        // Rich text runs are concatenated
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        debug!("Read {} shared strings", strings.len());
        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(r_id)) = (attribute(&e, b"name"), attribute(&e, b"r:id"))
                    {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to map rIds to worksheet part paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attribute(&e, b"Id");
                    let target = attribute(&e, b"Target");
                    let rel_type = attribute(&e, b"Type");

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ unless absolute
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet part into a grid
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        shared_strings: &[String],
    ) -> XlsxResult<Grid> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        let mut buf = Vec::new();
        let mut grid = Grid::new();

        // Position used for rows and cells that omit their `r` attribute
        let mut row: u32 = 0;
        let mut next_row: u32 = 0;
        let mut next_col: u16 = 0;

        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        row = Self::row_index(&e, next_row)?;
                        next_row = row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        cell = Some(Self::start_cell(&e, row, next_col)?);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"is" if cell.is_some() => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        row = Self::row_index(&e, next_row)?;
                        next_row = row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        // Valueless cell (usually only a style)
                        let pending = Self::start_cell(&e, row, next_col)?;
                        next_col = pending.col.saturating_add(1);
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Some(pending) = cell.as_mut() {
                        pending.text.push_str(&e.unescape()?);
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            next_col = pending.col.saturating_add(1);
                            let value = Self::cell_value(&pending, shared_strings)?;
                            if !value.is_empty() {
                                grid.set(pending.row, pending.col, value);
                            }
                        }
                        in_value = false;
                        in_inline_str = false;
                        in_inline_text = false;
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(grid)
    }

    /// 0-based index from a `<row r="…">` attribute, else the row after the previous one
    fn row_index(e: &BytesStart, next_row: u32) -> XlsxResult<u32> {
        let row = match attribute(e, b"r") {
            None => next_row,
            Some(r) => match r.parse::<u32>() {
                Ok(n) if n >= 1 => n - 1,
                _ => return Err(XlsxError::Parse(format!("Invalid row number: {}", r))),
            },
        };
        if row >= MAX_ROWS {
            return Err(XlsxError::Parse(format!(
                "Row number {} exceeds the sheet limit of {}",
                row as u64 + 1,
                MAX_ROWS
            )));
        }
        Ok(row)
    }

    fn start_cell(e: &BytesStart, row: u32, next_col: u16) -> XlsxResult<PendingCell> {
        let (row, col) = match attribute(e, b"r") {
            Some(cell_ref) => {
                let addr = CellAddress::parse(&cell_ref).map_err(|e| {
                    XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
                })?;
                (addr.row, addr.col)
            }
            None => (row, next_col),
        };

        Ok(PendingCell {
            row,
            col,
            cell_type: attribute(e, b"t"),
            text: String::new(),
        })
    }

    /// Convert collected cell text according to its type
    fn cell_value(cell: &PendingCell, shared_strings: &[String]) -> XlsxResult<CellValue> {
        let value = cell.text.as_str();
        if value.is_empty() {
            return Ok(CellValue::Empty);
        }

        let cell_value = match cell.cell_type.as_deref() {
            // Shared string
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::String(s.clone())
            }

            // Boolean
            Some("b") => CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),

            // Error (#N/A, #VALUE!, ...)
            Some("e") => CellValue::Error(value.to_string()),

            // Inline or formula string
            Some("inlineStr") | Some("str") => CellValue::String(decode_excel_escapes(value)),

            // Number (default type or explicit "n")
            None | Some("n") => match value.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(value.to_string()),
            },

            // Unknown type (e.g. ISO dates) - treat as string
            Some(_) => CellValue::String(value.to_string()),
        };

        Ok(cell_value)
    }
}
