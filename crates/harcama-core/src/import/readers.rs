//! File readers: delimited text, spreadsheets and PDF statements

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
    Pdf,
}

impl FileKind {
    /// Detect the kind from a file name's extension
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" | "tsv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
            Self::Pdf => "pdf",
        }
    }
}

/// A header row plus data rows, all cells as text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ============================================================================
// Delimited text
// ============================================================================

/// Read a CSV export: UTF-8 first, Windows-1254 / ISO-8859-9 as fallback
///
/// The delimiter is sniffed from the header line. Rows may have more fields
/// than the header (unquoted decimal commas); they are kept as-is for the
/// tabular importer to repair.
pub fn read_csv(bytes: &[u8]) -> Result<Table> {
    let text = decode_text(bytes);
    let header_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if header_line.is_empty() {
        return Err(Error::UnsupportedFile("CSV file is empty".to_string()));
    }
    let delimiter = sniff_delimiter(header_line);
    debug!(delimiter = %(delimiter as char), "Reading CSV");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(Table { headers, rows })
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to the Turkish 8-bit code page
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as Windows-1254");
            bytes.iter().map(|&b| decode_cp1254(b)).collect()
        }
    }
}

/// Windows-1254 byte to char (a superset of ISO-8859-9 for printable bytes)
fn decode_cp1254(b: u8) -> char {
    match b {
        0x00..=0x7F => b as char,
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9F => 'Ÿ',
        0x81 | 0x8D..=0x90 | 0x9D | 0x9E => char::REPLACEMENT_CHARACTER,
        0xD0 => 'Ğ',
        0xDD => 'İ',
        0xDE => 'Ş',
        0xF0 => 'ğ',
        0xFD => 'ı',
        0xFE => 'ş',
        // Remaining high bytes match Latin-1
        _ => b as char,
    }
}

/// Pick the most frequent of `,` `;` tab in the header line
fn sniff_delimiter(line: &str) -> u8 {
    let mut best = (b',', 0);
    for delimiter in [b',', b';', b'\t'] {
        let count = line.bytes().filter(|&b| b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

// ============================================================================
// Spreadsheets
// ============================================================================

/// Read the first sheet of an Excel/ODS workbook
///
/// The first non-empty row is the header.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::UnsupportedFile(format!("Could not read spreadsheet: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::UnsupportedFile("Spreadsheet has no sheets".to_string()))?
        .map_err(|e| Error::UnsupportedFile(format!("Could not read sheet: {}", e)))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()));

    let headers = rows
        .next()
        .ok_or_else(|| Error::UnsupportedFile("Spreadsheet is empty".to_string()))?;

    Ok(Table {
        headers,
        rows: rows.collect(),
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            warn!("Spreadsheet cell error: {:?}", e);
            String::new()
        }
    }
}

/// Whole floats print without a fraction, others with two decimals
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{:.2}", f)
    }
}

/// Excel serial day number to a date
///
/// The epoch is 1899-12-30, which absorbs Excel's 1900 leap-year bug.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

// ============================================================================
// PDF
// ============================================================================

/// Extract the text layer of a PDF, pages concatenated
pub fn read_pdf_text(bytes: &[u8]) -> Result<String> {
    if !bytes.starts_with(b"%PDF") {
        return Err(Error::UnsupportedFile("Not a PDF document".to_string()));
    }

    // pdf-extract panics on some malformed documents
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| Error::UnsupportedFile("PDF could not be parsed".to_string()))?;

    let text = extracted
        .map_err(|e| Error::UnsupportedFile(format!("Could not extract PDF text: {}", e)))?;

    if text.trim().is_empty() {
        return Err(Error::UnsupportedFile(
            "PDF has no text layer (scanned statements are not supported)".to_string(),
        ));
    }

    Ok(text)
}
