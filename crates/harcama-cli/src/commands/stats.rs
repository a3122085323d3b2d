//! Spending summary command

use anyhow::{bail, Result};
use chrono::Local;
use harcama_core::db::Database;
use harcama_core::stats::MAX_MONTHS;
use harcama_core::ImportConfig;

use super::format_try;

pub fn cmd_stats(db: &Database, config: &ImportConfig, months: u32) -> Result<()> {
    if months == 0 || months > MAX_MONTHS {
        bail!("--months must be between 1 and {}", MAX_MONTHS);
    }

    let summary = db.expense_summary(&config.catalog)?;
    let monthly = db.monthly_totals(months, Local::now().date_naive())?;

    println!();
    println!("📊 Spending Summary");
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Total: {} across {} expenses",
        format_try(summary.total_amount),
        summary.expense_count
    );

    if !summary.category_stats.is_empty() {
        println!();
        for stat in summary.category_stats.values() {
            println!(
                "   {} {:<15} {:>14} ({})",
                stat.icon,
                stat.name,
                format_try(stat.total),
                stat.count
            );
        }
    }

    println!();
    println!("📅 Last {} months", months);
    for month in &monthly {
        println!(
            "   {} │ {:>14} │ {} expenses",
            month.month,
            format_try(month.total),
            month.count
        );
    }

    Ok(())
}
