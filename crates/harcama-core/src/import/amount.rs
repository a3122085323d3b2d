//! Locale-aware amount parsing
//!
//! Turkish exports write `1.544,14`, Western ones `1,544.14`, and statements
//! mark debits with a trailing `-`. The parser normalizes all of these to a
//! positive magnitude and rejects values outside the plausibility window.
//!
//! Separator rules:
//! - both `,` and `.` present: the one that appears last is the decimal
//!   separator and the other is grouping (`1,234.567` is 1234.567)
//! - only one kind present: decimal when it occurs once with exactly two
//!   digits after it, otherwise grouping (`1,544` is 1544 and `45,5` is 455)

use thiserror::Error;

use crate::config::AmountThresholds;
use crate::models::round_money;

/// Why an amount was not accepted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmountRejection {
    #[error("amount is empty")]
    Empty,

    #[error("unparseable amount '{0}'")]
    Malformed(String),

    #[error("amount {value} is below the minimum of {min} (likely loyalty points)")]
    BelowMinimum { value: f64, min: f64 },

    #[error("amount {value} exceeds the maximum of {max}")]
    AboveMaximum { value: f64, max: f64 },
}

const CURRENCY_MARKERS: [&str; 7] = ["TRY", "TL", "EUR", "USD", "₺", "€", "$"];

/// Parses raw amount tokens into validated positive amounts
#[derive(Debug, Clone)]
pub struct AmountParser {
    thresholds: AmountThresholds,
}

impl AmountParser {
    pub fn new(thresholds: AmountThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AmountThresholds {
        &self.thresholds
    }

    /// Parse and validate an amount token
    pub fn parse(&self, raw: &str) -> Result<f64, AmountRejection> {
        let value = parse_magnitude(raw)?;

        if value < self.thresholds.min_amount {
            return Err(AmountRejection::BelowMinimum {
                value,
                min: self.thresholds.min_amount,
            });
        }
        if value > self.thresholds.max_amount {
            return Err(AmountRejection::AboveMaximum {
                value,
                max: self.thresholds.max_amount,
            });
        }

        Ok(value)
    }

    /// Accepted but large enough to deserve a second look
    pub fn is_borderline(&self, amount: f64) -> bool {
        amount > self.thresholds.borderline_amount
    }
}

/// Parse a token to a positive magnitude without plausibility checks
pub fn parse_magnitude(raw: &str) -> Result<f64, AmountRejection> {
    let mut s = raw.to_uppercase();
    for marker in CURRENCY_MARKERS {
        s = s.replace(marker, "");
    }
    s.retain(|c| !c.is_whitespace());

    // Sign markers and accounting parentheses; the sign itself is discarded
    let s = s.trim_matches(|c| matches!(c, '+' | '-' | '(' | ')'));
    if s.is_empty() {
        return Err(AmountRejection::Empty);
    }

    let normalized =
        normalize_separators(s).ok_or_else(|| AmountRejection::Malformed(raw.trim().to_string()))?;

    if !is_plain_decimal(&normalized) {
        return Err(AmountRejection::Malformed(raw.trim().to_string()));
    }

    normalized
        .parse::<f64>()
        .map(round_money)
        .map_err(|_| AmountRejection::Malformed(raw.trim().to_string()))
}

/// Rewrite to a single `.` decimal convention, or None if the separators
/// cannot be explained
fn normalize_separators(s: &str) -> Option<String> {
    let strip_all = || s.chars().filter(|c| *c != ',' && *c != '.').collect::<String>();

    let (position, separator, both_present) = match (s.rfind(','), s.rfind('.')) {
        (None, None) => return Some(s.to_string()),
        (Some(c), Some(d)) if c > d => (c, ',', true),
        (Some(_), Some(d)) => (d, '.', true),
        (Some(c), None) => (c, ',', false),
        (None, Some(d)) => (d, '.', false),
    };

    let tail = &s[position + 1..];
    let occurrences = s.matches(separator).count();

    if both_present {
        // The grouping separator may not follow the decimal one
        if occurrences != 1 {
            return None;
        }
    } else if occurrences != 1 || tail.len() != 2 {
        return Some(strip_all());
    }

    let integer: String = s[..position]
        .chars()
        .filter(|c| *c != ',' && *c != '.')
        .collect();
    let integer = if integer.is_empty() {
        "0".to_string()
    } else {
        integer
    };
    Some(format!("{}.{}", integer, tail))
}

/// `digits[.digits]`
fn is_plain_decimal(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let integer = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    digits(integer) && fraction.map_or(true, digits)
}
