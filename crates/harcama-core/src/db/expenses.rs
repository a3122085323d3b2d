//! Expense operations

use chrono::{Local, NaiveDate, SubsecRound, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_stored_date, parse_timestamp, Database};
use crate::error::{Error, Result};
use crate::import::ExpenseStore;
use crate::models::{round_money, Category, Expense, ExpenseFilter, ExpenseUpdate, NewExpense};

const EXPENSE_COLUMNS: &str = "id, title, amount, category, description, date, created_at";

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidData("Title cannot be empty".to_string()));
    }
    Ok(title.to_string())
}

fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidData(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }
    let rounded = round_money(amount);
    if rounded <= 0.0 {
        return Err(Error::InvalidData(format!(
            "Amount {} rounds to zero",
            amount
        )));
    }
    Ok(rounded)
}

/// Blank descriptions are stored as NULL
fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// WHERE clause and parameters for a filter
fn filter_clause(filter: &ExpenseFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(category) = filter.category {
        conditions.push("category = ?");
        values.push(category.as_str().to_string());
    }
    if let Some(from) = filter.from {
        conditions.push("date >= ?");
        values.push(from.to_string());
    }
    if let Some(to) = filter.to {
        conditions.push("date <= ?");
        values.push(to.to_string());
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

impl Database {
    /// Insert a new expense
    ///
    /// Assigns a fresh id and `created_at`; the date defaults to today.
    pub fn insert_expense(&self, new: &NewExpense) -> Result<Expense> {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            title: validate_title(&new.title)?,
            amount: validate_amount(new.amount)?,
            category: new.category,
            description: clean_description(new.description.as_deref()),
            date: new.date.unwrap_or_else(|| Local::now().date_naive()),
            created_at: Utc::now().trunc_subsecs(6),
        };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (id, title, amount, category, description, date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                expense.id,
                expense.title,
                expense.amount,
                expense.category.as_str(),
                expense.description,
                expense.date.to_string(),
                format_timestamp(&expense.created_at),
            ],
        )?;

        Ok(expense)
    }

    /// Get a single expense by id
    pub fn get_expense(&self, id: &str) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
                params![id],
                Self::row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List expenses, newest first
    pub fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Expense>> {
        let (clause, values) = filter_clause(filter);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses {} ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
            EXPENSE_COLUMNS,
            clause,
            limit.max(0),
            offset.max(0)
        ))?;

        let expenses = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_expense)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(expenses)
    }

    /// Count expenses matching a filter
    pub fn count_expenses(&self, filter: &ExpenseFilter) -> Result<i64> {
        let (clause, values) = filter_clause(filter);
        let conn = self.conn()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM expenses {}", clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All expenses dated within `[from, to]`, oldest first
    pub fn expenses_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE date >= ? AND date <= ? ORDER BY date, rowid",
            EXPENSE_COLUMNS
        ))?;
        let expenses = stmt
            .query_map(params![from.to_string(), to.to_string()], Self::row_to_expense)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(expenses)
    }

    /// Apply a partial update; None if the id is unknown
    ///
    /// An empty description clears it.
    pub fn update_expense(&self, id: &str, update: &ExpenseUpdate) -> Result<Option<Expense>> {
        let Some(mut expense) = self.get_expense(id)? else {
            return Ok(None);
        };

        if let Some(title) = &update.title {
            expense.title = validate_title(title)?;
        }
        if let Some(amount) = update.amount {
            expense.amount = validate_amount(amount)?;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(description) = &update.description {
            expense.description = clean_description(Some(description));
        }
        if let Some(date) = update.date {
            expense.date = date;
        }

        let conn = self.conn()?;
        conn.execute(
            "UPDATE expenses SET title = ?, amount = ?, category = ?, description = ?, date = ?
             WHERE id = ?",
            params![
                expense.title,
                expense.amount,
                expense.category.as_str(),
                expense.description,
                expense.date.to_string(),
                expense.id,
            ],
        )?;

        Ok(Some(expense))
    }

    /// Change only the category; None if the id is unknown
    pub fn update_expense_category(&self, id: &str, category: Category) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE expenses SET category = ? WHERE id = ?",
            params![category.as_str(), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_expense(id)
    }

    /// Delete an expense; false if the id is unknown
    pub fn delete_expense(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Column order: id, title, amount, category, description, date, created_at
    pub(crate) fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        let category: String = row.get(3)?;
        let date: String = row.get(5)?;
        let created_at: String = row.get(6)?;
        Ok(Expense {
            id: row.get(0)?,
            title: row.get(1)?,
            amount: row.get(2)?,
            category: category.parse().unwrap_or(Category::Other),
            description: row.get(4)?,
            date: parse_stored_date(5, &date)?,
            created_at: parse_timestamp(6, &created_at)?,
        })
    }
}

impl ExpenseStore for Database {
    fn insert_one(&self, expense: &NewExpense) -> Result<Expense> {
        self.insert_expense(expense)
    }
}
