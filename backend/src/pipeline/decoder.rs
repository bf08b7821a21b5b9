//! Turns uploaded bytes into ordered rows of `column -> value` strings.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Declared format of an upload, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    /// XLSX or legacy XLS workbook; only the first sheet is read.
    Spreadsheet,
}

impl FileFormat {
    /// Case-insensitive match on `.csv`, `.xlsx` and `.xls`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" | "xls" => Some(FileFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// A single decoded record: column name to cell text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("spreadsheet contains no sheets")]
    NoSheet,
}

impl From<calamine::Error> for DecodeError {
    fn from(err: calamine::Error) -> Self {
        DecodeError::Spreadsheet(err.to_string())
    }
}

/// Decodes `bytes` in the given format, preserving row order.
pub fn decode(bytes: &[u8], format: FileFormat) -> Result<Vec<RawRow>, DecodeError> {
    match format {
        FileFormat::Csv => decode_csv(bytes),
        FileFormat::Spreadsheet => decode_spreadsheet(bytes),
    }
}

/// The header line names the columns. Every header column appears on every
/// row; short rows simply lack their trailing columns.
fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(title, _)| !title.is_empty())
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// First sheet only. The first row is the header; blank cells are left out of
/// a row and fully blank rows are skipped.
fn decode_spreadsheet(bytes: &[u8]) -> Result<Vec<RawRow>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(DecodeError::NoSheet)??;

    let mut lines = range.rows();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    let titles: Vec<String> = header
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for line in lines {
        let row: RawRow = titles
            .iter()
            .zip(line)
            .filter(|(title, _)| !title.is_empty())
            .map(|(title, cell)| (title.clone(), cell_to_string(cell)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Numeric cells (phone numbers typed as numbers, mostly) become their plain
/// decimal text: `5551234.0` is rendered as `5551234`.
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A two-sheet workbook: a numeric phone, a missing note and a blank middle
/// row on the first sheet, and rows on the second sheet that must be ignored.
#[cfg(test)]
pub(crate) fn sample_workbook() -> Vec<u8> {
    use rust_xlsxwriter::Workbook;

    let mut workbook = Workbook::new();
    let leads = workbook.add_worksheet();
    leads.set_name("Leads").unwrap();
    leads.write_string(0, 0, "FirstName").unwrap();
    leads.write_string(0, 1, "Phone").unwrap();
    leads.write_string(0, 2, "Notes").unwrap();
    leads.write_string(1, 0, "Ann").unwrap();
    leads.write_number(1, 1, 15551234567.0).unwrap();
    leads.write_string(3, 0, "Bob").unwrap();
    leads.write_string(3, 1, "555-0102").unwrap();
    leads.write_string(3, 2, "vip").unwrap();

    let other = workbook.add_worksheet();
    other.set_name("Archive").unwrap();
    other.write_string(0, 0, "FirstName").unwrap();
    other.write_string(0, 1, "Phone").unwrap();
    other.write_string(1, 0, "Zed").unwrap();
    other.write_string(1, 1, "000").unwrap();

    workbook.save_to_buffer().unwrap()
}
