//! Row-by-row import of CSV and spreadsheet tables

use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Category, Expense, NewExpense};

use super::amount::AmountRejection;
use super::cleaner::CleanRejection;
use super::columns::{ColumnMapping, ColumnRef};
use super::readers::Table;
use super::{parse_date, ExpenseStore, ImportPipeline};

/// Why a data row was skipped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("title is missing")]
    MissingTitle,

    #[error(transparent)]
    Title(#[from] CleanRejection),

    #[error("amount is missing")]
    MissingAmount,

    #[error(transparent)]
    Amount(#[from] AmountRejection),

    #[error("could not be stored: {0}")]
    Storage(String),

    #[error("{0}")]
    Malformed(String),
}

/// Per-row result before storage
#[derive(Debug, Clone)]
pub enum ImportRowOutcome {
    Accepted(NewExpense),
    Skipped { row: usize, reason: RowError },
}

/// Result of a tabular import
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub total_rows: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Imported titles grouped by assigned category
    pub auto_categorization: BTreeMap<Category, Vec<String>>,
    pub detected_columns: ColumnMapping,
    /// Stored records, in row order
    #[serde(skip)]
    pub records: Vec<Expense>,
}

impl ImportPipeline {
    /// Import every data row of a table
    ///
    /// Fails only when the header cannot be mapped. Row failures (including
    /// storage failures) are recorded in `errors` as `Row n: reason`, with
    /// `n` counting data rows from 1.
    pub fn import_table(&self, table: &Table, store: &dyn ExpenseStore) -> Result<ImportSummary> {
        let mapping = self.mapper.map_columns(&table.headers)?;

        let mut summary = ImportSummary {
            imported: 0,
            total_rows: table.rows.len(),
            errors: Vec::new(),
            warnings: Vec::new(),
            auto_categorization: BTreeMap::new(),
            detected_columns: mapping.clone(),
            records: Vec::new(),
        };

        for (i, raw) in table.rows.iter().enumerate() {
            let row = i + 1;
            let outcome = match repair_row(raw, table.headers.len(), &mapping) {
                Ok(fields) => self.process_row(&mapping, row, &fields, &mut summary.warnings),
                Err(reason) => ImportRowOutcome::Skipped { row, reason },
            };

            match outcome {
                ImportRowOutcome::Accepted(new) => match store.insert_one(&new) {
                    Ok(expense) => {
                        summary.imported += 1;
                        summary
                            .auto_categorization
                            .entry(expense.category)
                            .or_default()
                            .push(expense.title.clone());
                        summary.records.push(expense);
                    }
                    Err(e) => {
                        warn!(row, error = %e, "Failed to store imported expense");
                        let reason = RowError::Storage(e.to_string());
                        summary.errors.push(format!("Row {}: {}", row, reason));
                    }
                },
                ImportRowOutcome::Skipped { row, reason } => {
                    debug!(row, reason = %reason, "Skipping row");
                    summary.errors.push(format!("Row {}: {}", row, reason));
                }
            }
        }

        info!(
            imported = summary.imported,
            total = summary.total_rows,
            errors = summary.errors.len(),
            "Table import finished"
        );
        Ok(summary)
    }

    /// Turn one (already repaired) row into an expense or a skip reason
    ///
    /// Non-fatal notes (unparseable date, borderline amount) go to `warnings`.
    pub fn process_row(
        &self,
        mapping: &ColumnMapping,
        row: usize,
        fields: &[String],
        warnings: &mut Vec<String>,
    ) -> ImportRowOutcome {
        let cell = |column: Option<&ColumnRef>| {
            column
                .and_then(|c| fields.get(c.index))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };
        let skip = |reason: RowError| ImportRowOutcome::Skipped { row, reason };

        let Some(raw_title) = cell(Some(&mapping.title)) else {
            return skip(RowError::MissingTitle);
        };
        let title = match self.cleaner.clean_title(raw_title) {
            Ok(title) => title,
            Err(e) => return skip(e.into()),
        };

        let Some(raw_amount) = cell(Some(&mapping.amount)) else {
            return skip(RowError::MissingAmount);
        };
        let amount = match self.parser.parse(raw_amount) {
            Ok(amount) => amount,
            Err(e) => return skip(e.into()),
        };
        if self.parser.is_borderline(amount) {
            warnings.push(format!(
                "Row {}: amount {:.2} for '{}' is unusually large, please verify",
                row, amount, title
            ));
        }

        let description = cell(mapping.description.as_ref()).map(|s| s.to_string());

        let today = Local::now().date_naive();
        let date = match cell(mapping.date.as_ref()) {
            Some(raw) => parse_date(raw).unwrap_or_else(|| {
                warnings.push(format!("Row {}: unrecognized date '{}', using today", row, raw));
                today
            }),
            None => today,
        };

        let category = cell(mapping.category.as_ref())
            .and_then(|value| self.catalog.resolve(value))
            .unwrap_or_else(|| {
                self.classifier
                    .classify(&title, description.as_deref().unwrap_or(""))
            });

        ImportRowOutcome::Accepted(NewExpense {
            title,
            amount,
            category,
            description,
            date: Some(date),
        })
    }
}

/// Fit a row to the header width
///
/// Short rows are padded. Long rows come from unquoted decimal commas in the
/// title or amount; they are repaired when the amount column directly
/// follows the title column: trailing columns are taken from the end,
/// leading ones from the start, and the amount is rebuilt from the last one
/// or two middle fields.
fn repair_row(
    fields: &[String],
    header_len: usize,
    mapping: &ColumnMapping,
) -> std::result::Result<Vec<String>, RowError> {
    if fields.len() <= header_len {
        let mut fields = fields.to_vec();
        fields.resize(header_len, String::new());
        return Ok(fields);
    }

    let (title, amount) = (mapping.title.index, mapping.amount.index);
    if amount != title + 1 {
        return Err(RowError::Malformed(format!(
            "row has {} fields but the header has {}",
            fields.len(),
            header_len
        )));
    }

    let after = header_len - amount - 1;
    let head = &fields[..title];
    let middle = &fields[title..fields.len() - after];
    let tail = &fields[fields.len() - after..];

    let n = middle.len();
    let (title_parts, amount_value) = if n >= 3 && joins_as_decimal(&middle[n - 2], &middle[n - 1]) {
        (&middle[..n - 2], format!("{},{}", middle[n - 2], middle[n - 1]))
    } else {
        (&middle[..n - 1], middle[n - 1].clone())
    };

    debug!(
        fields = fields.len(),
        header_len,
        amount = %amount_value,
        "Repaired ragged row"
    );

    let mut repaired = head.to_vec();
    repaired.push(title_parts.join(","));
    repaired.push(amount_value);
    repaired.extend_from_slice(tail);
    Ok(repaired)
}

/// Whether `a,b` reads as one number split by an unquoted comma:
/// `1.544` + `14` (decimal part) or `1` + `544` (thousands group)
fn joins_as_decimal(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());

    let b_core = b.trim_end_matches(['-', '+']);
    if b_core.len() == 2 && digits(b_core) {
        let a_core = a.trim_start_matches(['-', '+']);
        return digits(a_core) || is_dotted_thousands(a_core);
    }
    b.len() == 3 && digits(b) && (1..=3).contains(&a.len()) && digits(a)
}

/// `1.544` or `12.345.678`
fn is_dotted_thousands(s: &str) -> bool {
    let mut groups = s.split('.');
    let first = groups.next().unwrap_or_default();
    let mut rest = groups.peekable();
    rest.peek().is_some()
        && (1..=3).contains(&first.len())
        && first.bytes().all(|c| c.is_ascii_digit())
        && rest.all(|g| g.len() == 3 && g.bytes().all(|c| c.is_ascii_digit()))
}
