//! Domain models for Harcama

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Expense categories
///
/// The set is fixed; display names, colors, icons and keywords come from the
/// import configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Health,
    Education,
    Bills,
    Other,
}

impl Category {
    /// All categories in enumeration order
    pub const ALL: [Category; 8] = [
        Self::Food,
        Self::Transport,
        Self::Entertainment,
        Self::Shopping,
        Self::Health,
        Self::Education,
        Self::Bills,
        Self::Other,
    ];

    /// Categories that carry keywords (everything except `Other`)
    pub fn named() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|c| *c != Self::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Health => "health",
            Self::Education => "education",
            Self::Bills => "bills",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "transport" => Ok(Self::Transport),
            "entertainment" => Ok(Self::Entertainment),
            "shopping" => Ok(Self::Shopping),
            "health" => Ok(Self::Health),
            "education" => Ok(Self::Education),
            "bills" => Ok(Self::Bills),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display metadata for a category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDefinition {
    pub id: Category,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// A stored expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub title: String,
    /// Always positive, currency is implicitly TRY
    pub amount: f64,
    pub category: Category,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// An expense to be inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: Category,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Partial update; only the provided fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }
}

/// Filter for listing expenses
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<Category>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-category totals in the summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryStat {
    pub total: f64,
    pub count: i64,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Overall spending summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total_amount: f64,
    pub expense_count: i64,
    /// Keyed by category id; only categories with expenses appear
    pub category_stats: BTreeMap<Category, CategoryStat>,
}

/// Total spending for one calendar month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
    pub count: i64,
}

/// Month-by-month totals for a single category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTrend {
    pub category: Category,
    pub name: String,
    /// Aligned with `TrendsReport::months`
    pub totals: Vec<f64>,
    /// Change between the last two months, None when the earlier month is zero
    pub change_percentage: Option<f64>,
}

/// Category trends over the last N months
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsReport {
    pub months: Vec<String>,
    pub categories: Vec<CategoryTrend>,
}

/// Next-month projection for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub category: Category,
    pub name: String,
    pub predicted: f64,
}

/// Run-rate projection for the month in progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentMonthProjection {
    pub month: String,
    pub spent: f64,
    pub elapsed_days: u32,
    pub days_in_month: u32,
    pub projected: f64,
}

/// Spending predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// The month being predicted (`YYYY-MM`)
    pub month: String,
    /// Complete months the averages were computed from
    pub based_on: Vec<String>,
    pub total: f64,
    pub categories: Vec<CategoryPrediction>,
    pub current_month: CurrentMonthProjection,
}

// ============================================================================
// Limits
// ============================================================================

/// A monthly spending limit for a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLimit {
    pub id: String,
    pub category: Category,
    /// `YYYY-MM`
    pub month: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// How close spending is to a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    /// Below 80% of the limit
    Ok,
    /// Between 80% and 100%
    Warning,
    /// Over the limit
    Exceeded,
}

impl LimitStatus {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > 100.0 {
            Self::Exceeded
        } else if percentage >= 80.0 {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

/// Spending measured against a limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitCheck {
    pub category: Category,
    pub name: String,
    pub month: String,
    pub limit: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: LimitStatus,
}

/// Round a monetary value to two decimal places
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("groceries".parse::<Category>().is_err());
        assert_eq!(" FOOD ".parse::<Category>().unwrap(), Category::Food);
    }

    #[test]
    fn test_named_excludes_other() {
        let named: Vec<_> = Category::named().collect();
        assert_eq!(named.len(), 7);
        assert!(!named.contains(&Category::Other));
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Entertainment).unwrap();
        assert_eq!(json, "\"entertainment\"");
    }

    #[test]
    fn test_limit_status_thresholds() {
        assert_eq!(LimitStatus::from_percentage(10.0), LimitStatus::Ok);
        assert_eq!(LimitStatus::from_percentage(80.0), LimitStatus::Warning);
        assert_eq!(LimitStatus::from_percentage(100.0), LimitStatus::Warning);
        assert_eq!(LimitStatus::from_percentage(100.5), LimitStatus::Exceeded);
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(1544.144), 1544.14);
        assert_eq!(round_money(2.499), 2.5);
    }
}
