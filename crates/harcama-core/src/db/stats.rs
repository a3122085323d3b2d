//! Spending rollups: summary, monthly totals, trends and predictions

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rusqlite::params;

use super::Database;
use crate::config::CategoryCatalog;
use crate::error::Result;
use crate::models::{
    round_money, Category, CategoryPrediction, CategoryStat, CategoryTrend, CurrentMonthProjection,
    ExpenseSummary, MonthlyTotal, PredictionReport, TrendsReport,
};
use crate::stats::{change_percentage, months_ending, Month, PREDICTION_WINDOW};

/// (total, count) keyed by month key and category
type MonthCategoryTotals = HashMap<(String, Category), (f64, i64)>;

impl Database {
    /// Totals over every stored expense, grouped by category
    pub fn expense_summary(&self, catalog: &CategoryCatalog) -> Result<ExpenseSummary> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, SUM(amount), COUNT(*) FROM expenses GROUP BY category",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut summary = ExpenseSummary::default();
        for (category, total, count) in rows {
            let category = category.parse().unwrap_or(Category::Other);
            let definition = catalog.definition(category);
            let stat = summary
                .category_stats
                .entry(category)
                .or_insert_with(|| CategoryStat {
                    total: 0.0,
                    count: 0,
                    name: definition.name.clone(),
                    color: definition.color.clone(),
                    icon: definition.icon.clone(),
                });
            stat.total = round_money(stat.total + total);
            stat.count += count;
            summary.total_amount += total;
            summary.expense_count += count;
        }
        summary.total_amount = round_money(summary.total_amount);

        Ok(summary)
    }

    /// Totals for the `months` calendar months ending with `today`'s month
    ///
    /// Months without expenses are included with zero totals.
    pub fn monthly_totals(&self, months: u32, today: NaiveDate) -> Result<Vec<MonthlyTotal>> {
        let window = months_ending(Month::of(today), months);
        let totals = self.month_category_totals(&window)?;

        Ok(window
            .iter()
            .map(|month| {
                let key = month.key();
                let (total, count) = totals
                    .iter()
                    .filter(|((m, _), _)| *m == key)
                    .fold((0.0, 0), |(t, c), (_, (total, count))| (t + total, c + count));
                MonthlyTotal {
                    month: key,
                    total: round_money(total),
                    count,
                }
            })
            .collect())
    }

    /// Per-category monthly totals with the change between the last two months
    ///
    /// Only categories with spending somewhere in the window are listed.
    pub fn category_trends(
        &self,
        months: u32,
        today: NaiveDate,
        catalog: &CategoryCatalog,
    ) -> Result<TrendsReport> {
        let window = months_ending(Month::of(today), months);
        let totals = self.month_category_totals(&window)?;
        let keys: Vec<String> = window.iter().map(Month::key).collect();

        let categories = Category::ALL
            .iter()
            .filter_map(|&category| {
                let series: Vec<f64> = keys
                    .iter()
                    .map(|key| {
                        totals
                            .get(&(key.clone(), category))
                            .map(|(total, _)| round_money(*total))
                            .unwrap_or(0.0)
                    })
                    .collect();
                if series.iter().all(|t| *t == 0.0) {
                    return None;
                }
                let change = match series.as_slice() {
                    [.., previous, current] => change_percentage(*previous, *current),
                    _ => None,
                };
                Some(CategoryTrend {
                    category,
                    name: catalog.definition(category).name.clone(),
                    totals: series,
                    change_percentage: change,
                })
            })
            .collect();

        Ok(TrendsReport {
            months: keys,
            categories,
        })
    }

    /// Next month's spending projected from the last complete months, plus a
    /// run-rate projection for the current month
    pub fn predictions(&self, today: NaiveDate, catalog: &CategoryCatalog) -> Result<PredictionReport> {
        let current = Month::of(today);
        let history = months_ending(current.offset(-1), PREDICTION_WINDOW);
        let totals = self.month_category_totals(&history)?;

        let mut per_category: BTreeMap<Category, f64> = BTreeMap::new();
        for ((_, category), (total, _)) in &totals {
            *per_category.entry(*category).or_default() += total;
        }

        let categories: Vec<CategoryPrediction> = per_category
            .into_iter()
            .map(|(category, sum)| CategoryPrediction {
                category,
                name: catalog.definition(category).name.clone(),
                predicted: round_money(sum / PREDICTION_WINDOW as f64),
            })
            .filter(|p| p.predicted > 0.0)
            .collect();
        let total = round_money(categories.iter().map(|p| p.predicted).sum());

        let spent = self.total_between(current.first_day(), today)?;
        let elapsed_days = today.day();
        let days_in_month = current.days();
        let projected = round_money(spent / elapsed_days as f64 * days_in_month as f64);

        Ok(PredictionReport {
            month: current.offset(1).key(),
            based_on: history.iter().map(Month::key).collect(),
            total,
            categories,
            current_month: CurrentMonthProjection {
                month: current.key(),
                spent: round_money(spent),
                elapsed_days,
                days_in_month,
                projected,
            },
        })
    }

    /// Sum of amounts dated within `[from, to]`, optionally for one category
    pub(crate) fn spent_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        category: Option<Category>,
    ) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = match category {
            Some(category) => conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM expenses
                 WHERE date >= ? AND date <= ? AND category = ?",
                params![from.to_string(), to.to_string(), category.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE date >= ? AND date <= ?",
                params![from.to_string(), to.to_string()],
                |row| row.get(0),
            )?,
        };
        Ok(total)
    }

    fn total_between(&self, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        self.spent_between(from, to, None)
    }

    fn month_category_totals(&self, window: &[Month]) -> Result<MonthCategoryTotals> {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return Ok(HashMap::new());
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT substr(date, 1, 7) AS month, category, SUM(amount), COUNT(*)
             FROM expenses
             WHERE date >= ? AND date <= ?
             GROUP BY month, category",
        )?;
        let rows = stmt
            .query_map(
                params![first.first_day().to_string(), last.last_day().to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut totals = MonthCategoryTotals::new();
        for (month, category, total, count) in rows {
            let category = category.parse().unwrap_or(Category::Other);
            let entry = totals.entry((month, category)).or_insert((0.0, 0));
            entry.0 += total;
            entry.1 += count;
        }
        Ok(totals)
    }
}
