//! Statement ingestion pipeline
//!
//! Turns bank exports into expense records:
//! - `readers` - CSV (UTF-8 or Turkish 8-bit), spreadsheets and PDF text
//! - `columns` - header row to canonical field mapping
//! - `amount` - locale-aware amount parsing with plausibility limits
//! - `cleaner` - ordered noise-stripping rules for merchant descriptions
//! - `classifier` - keyword scoring into categories
//! - `tabular` - row-by-row import of CSV/spreadsheet tables
//! - `statement` - line-pattern import of PDF statement text
//!
//! Every stage is deterministic and offline. Rows that fail are skipped and
//! reported; they never abort the batch.

use chrono::NaiveDate;

use crate::config::{ImportConfig, StatementSettings};
use crate::error::Result;
use crate::models::{Expense, NewExpense};

pub mod amount;
pub mod classifier;
pub mod cleaner;
pub mod columns;
pub mod readers;
pub mod statement;
pub mod tabular;

pub use amount::{AmountParser, AmountRejection};
pub use classifier::Classifier;
pub use cleaner::{CleanRejection, CleaningRule, DescriptionCleaner};
pub use columns::{ColumnMapper, ColumnMapping, ColumnRef, Field};
pub use readers::{read_csv, read_pdf_text, read_spreadsheet, FileKind, Table};
pub use statement::{StatementCandidate, StatementScan, StatementSummary};
pub use tabular::{ImportRowOutcome, ImportSummary, RowError};

/// Where the pipeline writes accepted records
///
/// Records are inserted one at a time; a failure affects only that record.
pub trait ExpenseStore {
    fn insert_one(&self, expense: &NewExpense) -> Result<Expense>;
}

/// Result of importing a file of any supported kind
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Tabular(ImportSummary),
    Statement(StatementSummary),
}

/// The assembled pipeline: parser, cleaner, classifier and column mapper
///
/// Built once from an `ImportConfig`; regexes are compiled here.
pub struct ImportPipeline {
    parser: AmountParser,
    cleaner: DescriptionCleaner,
    classifier: Classifier,
    mapper: ColumnMapper,
    catalog: crate::config::CategoryCatalog,
    statement: StatementSettings,
    line_pattern: regex::Regex,
}

impl ImportPipeline {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        Ok(Self {
            parser: AmountParser::new(config.amounts.clone()),
            cleaner: DescriptionCleaner::new(&config.point_keywords)?,
            classifier: Classifier::new(&config.catalog),
            mapper: ColumnMapper::new(&config.columns),
            catalog: config.catalog.clone(),
            statement: config.statement.clone(),
            line_pattern: statement::line_pattern()?,
        })
    }

    pub fn parser(&self) -> &AmountParser {
        &self.parser
    }

    pub fn cleaner(&self) -> &DescriptionCleaner {
        &self.cleaner
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn mapper(&self) -> &ColumnMapper {
        &self.mapper
    }

    /// Read and import a file, picking the reader from the file name
    pub fn import_file(
        &self,
        filename: &str,
        bytes: &[u8],
        store: &dyn ExpenseStore,
    ) -> Result<ImportOutcome> {
        let kind = FileKind::from_filename(filename).ok_or_else(|| {
            crate::error::Error::UnsupportedFile(format!(
                "{}: expected .csv, .xlsx, .xls or .pdf",
                filename
            ))
        })?;

        match kind {
            FileKind::Csv => {
                let table = read_csv(bytes)?;
                Ok(ImportOutcome::Tabular(self.import_table(&table, store)?))
            }
            FileKind::Spreadsheet => {
                let table = read_spreadsheet(bytes)?;
                Ok(ImportOutcome::Tabular(self.import_table(&table, store)?))
            }
            FileKind::Pdf => {
                let text = read_pdf_text(bytes)?;
                Ok(ImportOutcome::Statement(self.import_statement(&text, store)?))
            }
        }
    }
}

/// Lower-case text for matching: Turkish letters folded to ASCII,
/// punctuation (except `&`) turned into spaces, whitespace collapsed
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let folded = match c {
            'İ' | 'I' | 'ı' | 'i' => 'i',
            'Ç' | 'ç' => 'c',
            'Ğ' | 'ğ' => 'g',
            'Ö' | 'ö' => 'o',
            'Ş' | 'ş' => 's',
            'Ü' | 'ü' => 'u',
            c if c.is_alphanumeric() || c == '&' => {
                out.extend(c.to_lowercase());
                continue;
            }
            _ => ' ',
        };
        out.push(folded);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a date cell in any of the formats seen in Turkish and international exports
///
/// A trailing time component is ignored.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split_whitespace().next()?;
    let date_part = date_part.split('T').next().unwrap_or(date_part);

    // Two-digit years first: %Y would read "24" as year 24
    let formats = [
        "%d.%m.%y", // 15.01.24
        "%d/%m/%y", // 15/01/24
        "%Y-%m-%d", // 2024-01-15
        "%d.%m.%Y", // 15.01.2024
        "%d/%m/%Y", // 15/01/2024
        "%d-%m-%Y", // 15-01-2024
        "%Y/%m/%d", // 2024/01/15
        "%Y.%m.%d", // 2024.01.15
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_folds_turkish() {
        assert_eq!(normalize_text("İŞLEM TARİHİ"), "islem tarihi");
        assert_eq!(normalize_text("Açıklama"), "aciklama");
        assert_eq!(normalize_text("ÇİÇEKSEPETİ  Ödeme"), "ciceksepeti odeme");
        assert_eq!(normalize_text("Tutar (TL)"), "tutar tl");
        assert_eq!(normalize_text("H&M"), "h&m");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date("15.01.2024"), Some(expected));
        assert_eq!(parse_date("15/01/2024"), Some(expected));
        assert_eq!(parse_date("15-01-2024"), Some(expected));
        assert_eq!(parse_date("2024/01/15"), Some(expected));
        assert_eq!(parse_date("15.01.24"), Some(expected));
        assert_eq!(parse_date("2024-01-15 13:45:00"), Some(expected));
        assert_eq!(parse_date("2024-01-15T13:45:00"), Some(expected));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("32.01.2024"), None);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        use crate::db::Database;

        let config = ImportConfig::embedded().unwrap();
        let pipeline = ImportPipeline::new(&config).unwrap();
        let db = Database::in_memory().unwrap();
        let result = pipeline.import_file("notes.docx", b"hello", &db);
        assert!(matches!(
            result,
            Err(crate::error::Error::UnsupportedFile(_))
        ));
    }
}
