//! Monthly category limits

use chrono::{Local, NaiveDate, Utc};
use rusqlite::params;
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, Database};
use crate::config::CategoryCatalog;
use crate::error::{Error, Result};
use crate::models::{round_money, Category, CategoryLimit, LimitCheck, LimitStatus};
use crate::stats::Month;

/// Resolve an optional `YYYY-MM` month, defaulting to the current one
fn resolve_month(month: Option<&str>) -> Result<Month> {
    match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => Month::parse(m),
        None => Ok(Month::of(Local::now().date_naive())),
    }
}

impl Database {
    /// Create or replace the limit for a category and month
    pub fn set_limit(
        &self,
        category: Category,
        month: Option<&str>,
        amount: f64,
    ) -> Result<CategoryLimit> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Limit must be positive, got {}",
                amount
            )));
        }
        let month = resolve_month(month)?.key();
        let amount = round_money(amount);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO category_limits (id, category, month, amount, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(category, month) DO UPDATE SET amount = excluded.amount",
            params![
                Uuid::new_v4().to_string(),
                category.as_str(),
                month,
                amount,
                format_timestamp(&Utc::now()),
            ],
        )?;

        let limit = conn.query_row(
            "SELECT id, category, month, amount, created_at FROM category_limits
             WHERE category = ? AND month = ?",
            params![category.as_str(), month],
            Self::row_to_limit,
        )?;
        Ok(limit)
    }

    /// All limits for a month, in category order
    pub fn list_limits(&self, month: Option<&str>) -> Result<Vec<CategoryLimit>> {
        let month = resolve_month(month)?.key();
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, month, amount, created_at FROM category_limits WHERE month = ?",
        )?;
        let mut limits = stmt
            .query_map(params![month], Self::row_to_limit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        limits.sort_by_key(|l| l.category);
        Ok(limits)
    }

    /// Measure the month's spending against each of its limits
    pub fn check_limits(
        &self,
        month: Option<&str>,
        catalog: &CategoryCatalog,
    ) -> Result<Vec<LimitCheck>> {
        let resolved = resolve_month(month)?;
        let (from, to): (NaiveDate, NaiveDate) = (resolved.first_day(), resolved.last_day());

        self.list_limits(Some(&resolved.key()))?
            .into_iter()
            .map(|limit| -> Result<LimitCheck> {
                let spent = round_money(self.spent_between(from, to, Some(limit.category))?);
                let percentage = round_money(spent / limit.amount * 100.0);
                Ok(LimitCheck {
                    category: limit.category,
                    name: catalog.definition(limit.category).name.clone(),
                    month: limit.month,
                    limit: limit.amount,
                    spent,
                    remaining: round_money((limit.amount - spent).max(0.0)),
                    percentage,
                    status: LimitStatus::from_percentage(percentage),
                })
            })
            .collect()
    }

    /// Column order: id, category, month, amount, created_at
    fn row_to_limit(row: &rusqlite::Row) -> rusqlite::Result<CategoryLimit> {
        let category: String = row.get(1)?;
        let created_at: String = row.get(4)?;
        Ok(CategoryLimit {
            id: row.get(0)?,
            category: category.parse().unwrap_or(Category::Other),
            month: row.get(2)?,
            amount: row.get(3)?,
            created_at: parse_timestamp(4, &created_at)?,
        })
    }
}
