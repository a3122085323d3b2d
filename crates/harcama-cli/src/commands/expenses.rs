//! Expense and category listings

use anyhow::Result;
use harcama_core::{db::Database, ExpenseFilter, ImportConfig};

use super::{format_try, truncate};

pub fn cmd_expenses(db: &Database, config: &ImportConfig, limit: i64) -> Result<()> {
    let expenses = db.list_expenses(&ExpenseFilter::default(), limit, 0)?;

    if expenses.is_empty() {
        println!("No expenses found. Import a statement with:");
        println!("  harcama import --file ekstre.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Expenses");
    println!("   ─────────────────────────────────────────────────────────────");

    for expense in expenses {
        let category = config.catalog.definition(expense.category);
        println!(
            "   {} │ {:>14} │ {} {:<12} │ {}",
            expense.date,
            format_try(expense.amount),
            category.icon,
            category.name,
            truncate(&expense.title, 40)
        );
    }

    Ok(())
}

pub fn cmd_categories(config: &ImportConfig) -> Result<()> {
    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────");

    for definition in config.catalog.definitions() {
        let keywords = config.catalog.keywords(definition.id).len();
        println!(
            "   {} {:<14} {:<15} {} │ {} keywords",
            definition.icon,
            definition.id.as_str(),
            definition.name,
            definition.color,
            keywords
        );
    }

    Ok(())
}
