//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db, load_config) and `init`
//! - `import` - Statement import (CSV, Excel, PDF)
//! - `expenses` - Expense and category listings
//! - `stats` - Spending summary and monthly totals
//! - `serve` - Web server command

pub mod core;
pub mod expenses;
pub mod import;
pub mod serve;
pub mod stats;

// Re-export command functions for main.rs
pub use core::*;
pub use expenses::*;
pub use import::*;
pub use serve::*;
pub use stats::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount in Turkish style: `1.544,14 TL`
pub fn format_try(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{},{:02} TL", sign, grouped, cents % 100)
}
