//! Line-pattern import of PDF statement text
//!
//! A transaction line starts with a `dd.mm.yyyy` (or `dd/mm/yyyy`) date and
//! ends with an amount; everything between is the merchant description.
//! Page furniture (column headers, totals, page numbers) is dropped by
//! marker words before matching.

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Category, Expense, NewExpense};

use super::{normalize_text, parse_date, ExpenseStore, ImportPipeline};

const LINE_PATTERN: &str =
    r"^\s*(\d{1,2}[./]\d{1,2}[./]\d{4})\s+(.+?)\s+([-+]?\(?[\d.,]*\d\)?\s*(?:(?i:TL)|₺)?\s*[-+]?)\s*$";

pub(super) fn line_pattern() -> Result<Regex> {
    Ok(Regex::new(LINE_PATTERN)?)
}

/// A transaction detected in statement text
#[derive(Debug, Clone, Serialize)]
pub struct StatementCandidate {
    /// 1-based line number in the extracted text
    pub line: usize,
    pub date: NaiveDate,
    pub title: String,
    pub amount: f64,
    pub category: Category,
    pub raw: String,
}

/// Detection pass over statement text, before anything is stored
#[derive(Debug, Clone, Default)]
pub struct StatementScan {
    pub lines_scanned: usize,
    /// Lines that looked like transactions but were rejected
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub candidates: Vec<StatementCandidate>,
}

/// Result of a statement import
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatementSummary {
    pub lines_scanned: usize,
    pub detected: usize,
    pub auto_added: usize,
    /// Detected beyond the auto-add limit
    pub not_added: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub samples: Vec<StatementCandidate>,
    #[serde(skip)]
    pub records: Vec<Expense>,
}

impl ImportPipeline {
    /// Detect transaction lines without storing anything
    pub fn extract_statement(&self, text: &str) -> StatementScan {
        let markers: Vec<String> = self
            .statement
            .skip_markers
            .iter()
            .map(|m| format!(" {} ", normalize_text(m)))
            .filter(|m| !m.trim().is_empty())
            .collect();
        let today = Local::now().date_naive();

        let mut scan = StatementScan::default();
        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            scan.lines_scanned += 1;

            let folded = format!(" {} ", normalize_text(line));
            if markers.iter().any(|m| folded.contains(m.as_str())) {
                continue;
            }

            let Some(caps) = self.line_pattern.captures(line) else {
                continue;
            };
            let (raw_date, raw_title, raw_amount) = (&caps[1], &caps[2], &caps[3]);

            let title = match self.cleaner.clean_title(raw_title) {
                Ok(title) => title,
                Err(reason) => {
                    debug!(line = line_no, reason = %reason, "Skipping statement line");
                    scan.skipped += 1;
                    continue;
                }
            };
            let amount = match self.parser.parse(raw_amount) {
                Ok(amount) => amount,
                Err(reason) => {
                    debug!(line = line_no, reason = %reason, "Skipping statement line");
                    scan.skipped += 1;
                    continue;
                }
            };
            if self.parser.is_borderline(amount) {
                scan.warnings.push(format!(
                    "Line {}: amount {:.2} for '{}' is unusually large, please verify",
                    line_no, amount, title
                ));
            }

            let date = parse_date(raw_date).unwrap_or_else(|| {
                scan.warnings.push(format!(
                    "Line {}: unrecognized date '{}', using today",
                    line_no, raw_date
                ));
                today
            });
            let category = self.classifier.classify(&title, "");

            scan.candidates.push(StatementCandidate {
                line: line_no,
                date,
                title,
                amount,
                category,
                raw: line.trim().to_string(),
            });
        }

        scan
    }

    /// Detect transactions and store the first `auto_add_limit` of them
    pub fn import_statement(&self, text: &str, store: &dyn ExpenseStore) -> Result<StatementSummary> {
        let scan = self.extract_statement(text);
        let limit = self.statement.auto_add_limit;

        let mut summary = StatementSummary {
            lines_scanned: scan.lines_scanned,
            detected: scan.candidates.len(),
            not_added: scan.candidates.len().saturating_sub(limit),
            skipped: scan.skipped,
            warnings: scan.warnings,
            samples: scan
                .candidates
                .iter()
                .take(self.statement.sample_size)
                .cloned()
                .collect(),
            ..Default::default()
        };

        for candidate in scan.candidates.into_iter().take(limit) {
            let new = NewExpense {
                title: candidate.title,
                amount: candidate.amount,
                category: candidate.category,
                description: Some(format!("PDF: {}", candidate.raw)),
                date: Some(candidate.date),
            };
            match store.insert_one(&new) {
                Ok(expense) => {
                    summary.auto_added += 1;
                    summary.records.push(expense);
                }
                Err(e) => {
                    warn!(line = candidate.line, error = %e, "Failed to store statement expense");
                    summary
                        .errors
                        .push(format!("Line {}: could not be stored: {}", candidate.line, e));
                }
            }
        }

        info!(
            lines = summary.lines_scanned,
            detected = summary.detected,
            added = summary.auto_added,
            "Statement import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::Utc;

    use super::*;
    use crate::config::ImportConfig;
    use crate::error::Error;

    #[derive(Default)]
    struct MemoryStore {
        stored: RefCell<Vec<Expense>>,
        fail: bool,
    }

    impl ExpenseStore for MemoryStore {
        fn insert_one(&self, expense: &NewExpense) -> Result<Expense> {
            if self.fail {
                return Err(Error::InvalidData("database is locked".to_string()));
            }
            let stored = Expense {
                id: format!("id-{}", self.stored.borrow().len()),
                title: expense.title.clone(),
                amount: expense.amount,
                category: expense.category,
                description: expense.description.clone(),
                date: expense.date.unwrap_or_else(|| Local::now().date_naive()),
                created_at: Utc::now(),
            };
            self.stored.borrow_mut().push(stored.clone());
            Ok(stored)
        }
    }

    fn pipeline() -> ImportPipeline {
        ImportPipeline::new(&ImportConfig::embedded().unwrap()).unwrap()
    }

    const STATEMENT: &str = "\
HESAP ÖZETİ
İŞLEM TARİHİ AÇIKLAMA TUTAR

15.01.2024 MIGROS ATASEHIR ISTANBUL TR 1.544,14
16.01.2024 SHELL BENZIN KAZANILAN WORLDPUAN:12 850,00 TL
17/01/2024 NETFLIX.COM 99,99-
18.01.2024 MAXIMIL PUAN KAZANIMI 0,46
19.01.2024 AB 45,00
Sayfa 1 / 3
TOPLAM 2.494,13
random text line
";

    #[test]
    fn test_extract_statement_lines() {
        let scan = pipeline().extract_statement(STATEMENT);

        assert_eq!(scan.lines_scanned, 10);
        assert_eq!(scan.skipped, 2);
        assert_eq!(scan.candidates.len(), 3);

        let migros = &scan.candidates[0];
        assert_eq!(migros.line, 4);
        assert_eq!(migros.title, "MIGROS ATASEHIR ISTANBUL");
        assert_eq!(migros.amount, 1544.14);
        assert_eq!(migros.category, Category::Food);
        assert_eq!(migros.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let shell = &scan.candidates[1];
        assert_eq!(shell.title, "SHELL BENZIN");
        assert_eq!(shell.amount, 850.0);
        assert_eq!(shell.category, Category::Transport);

        let netflix = &scan.candidates[2];
        assert_eq!(netflix.amount, 99.99);
        assert_eq!(netflix.date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
    }

    #[test]
    fn test_line_pattern() {
        let re = line_pattern().unwrap();
        let caps = re
            .captures("25.02.2024 METRO UMRANIYE TEKEL ISTANBUL TR MAXIMIL:3,09 1.544,14-")
            .unwrap();
        assert_eq!(&caps[1], "25.02.2024");
        assert_eq!(&caps[2], "METRO UMRANIYE TEKEL ISTANBUL TR MAXIMIL:3,09");
        assert_eq!(&caps[3], "1.544,14-");

        assert!(re.captures("Son ödeme tarihi 05.03.2024").is_none());
        assert!(re.captures("25.02.24 SHORT YEAR 10,00").is_none());
    }

    #[test]
    fn test_lowercase_currency_suffix() {
        let re = line_pattern().unwrap();
        let caps = re.captures("20.01.2024 STARBUCKS KADIKOY 85,50 tl").unwrap();
        assert_eq!(&caps[2], "STARBUCKS KADIKOY");
        assert_eq!(&caps[3], "85,50 tl");

        let scan = pipeline().extract_statement("21.01.2024 STARBUCKS MODA 120,00 Tl-\n");
        assert_eq!(scan.candidates.len(), 1);
        assert_eq!(scan.candidates[0].title, "STARBUCKS MODA");
        assert_eq!(scan.candidates[0].amount, 120.0);
    }

    #[test]
    fn test_import_statement_stores_candidates() {
        let store = MemoryStore::default();
        let summary = pipeline().import_statement(STATEMENT, &store).unwrap();

        assert_eq!(summary.detected, 3);
        assert_eq!(summary.auto_added, 3);
        assert_eq!(summary.not_added, 0);
        assert_eq!(summary.samples.len(), 3);
        assert!(summary.errors.is_empty());

        let stored = store.stored.borrow();
        assert_eq!(stored.len(), 3);
        assert_eq!(
            stored[0].description.as_deref(),
            Some("PDF: 15.01.2024 MIGROS ATASEHIR ISTANBUL TR 1.544,14")
        );
    }

    #[test]
    fn test_auto_add_limit_and_samples() {
        let text: String = (1..=25)
            .map(|day| format!("{:02}.03.2024 MIGROS MARKET {} 10,00\n", day, day))
            .collect();
        let store = MemoryStore::default();
        let summary = pipeline().import_statement(&text, &store).unwrap();

        assert_eq!(summary.detected, 25);
        assert_eq!(summary.auto_added, 20);
        assert_eq!(summary.not_added, 5);
        assert_eq!(summary.samples.len(), 5);
        assert_eq!(store.stored.borrow().len(), 20);
    }

    #[test]
    fn test_storage_failures_are_recorded() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let summary = pipeline().import_statement(STATEMENT, &store).unwrap();
        assert_eq!(summary.auto_added, 0);
        assert_eq!(summary.errors.len(), 3);
        assert!(summary.errors[0].starts_with("Line 4: could not be stored"));
    }

    #[test]
    fn test_text_without_transactions() {
        let store = MemoryStore::default();
        let summary = pipeline()
            .import_statement("Hesap özeti\nMüşteri hizmetleri 0850 000 00 00\n", &store)
            .unwrap();
        assert_eq!(summary.detected, 0);
        assert_eq!(summary.lines_scanned, 2);
        assert!(summary.records.is_empty());
    }
}
