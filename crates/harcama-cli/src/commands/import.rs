//! Statement import command

use std::path::Path;

use anyhow::{Context, Result};
use harcama_core::{db::Database, ImportConfig, ImportOutcome, ImportPipeline};
use harcama_core::{ImportSummary, StatementSummary};

use super::{format_try, truncate};

pub fn cmd_import(db: &Database, config: &ImportConfig, file: &Path) -> Result<()> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", file.display()))?;
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!("📥 Importing {}...", file.display());

    let pipeline = ImportPipeline::new(config).context("Failed to build import pipeline")?;
    let outcome = pipeline
        .import_file(filename, &bytes, db)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    match &outcome {
        ImportOutcome::Tabular(summary) => print_table_summary(summary),
        ImportOutcome::Statement(summary) => print_statement_summary(summary),
    }

    Ok(())
}

fn print_table_summary(summary: &ImportSummary) {
    let mapping = &summary.detected_columns;
    println!(
        "   Columns: title='{}', amount='{}'{}",
        mapping.title.header,
        mapping.amount.header,
        mapping
            .date
            .as_ref()
            .map(|d| format!(", date='{}'", d.header))
            .unwrap_or_default()
    );

    println!();
    println!(
        "✅ Imported {} of {} rows",
        summary.imported, summary.total_rows
    );

    for record in &summary.records {
        println!(
            "   {} │ {:>14} │ {:<13} │ {}",
            record.date,
            format_try(record.amount),
            record.category.as_str(),
            truncate(&record.title, 40)
        );
    }

    print_problems(&summary.warnings, &summary.errors);
}

fn print_statement_summary(summary: &StatementSummary) {
    println!("   Scanned {} lines", summary.lines_scanned);
    println!();
    println!(
        "✅ Detected {} transactions, added {}",
        summary.detected, summary.auto_added
    );
    if summary.not_added > 0 {
        println!(
            "   {} more were detected but not added automatically",
            summary.not_added
        );
    }

    for candidate in &summary.samples {
        println!(
            "   {} │ {:>14} │ {:<13} │ {}",
            candidate.date,
            format_try(candidate.amount),
            candidate.category.as_str(),
            truncate(&candidate.title, 40)
        );
    }

    print_problems(&summary.warnings, &summary.errors);
}

fn print_problems(warnings: &[String], errors: &[String]) {
    if !warnings.is_empty() {
        println!();
        println!("⚠️  {} warning(s):", warnings.len());
        for warning in warnings {
            println!("   {}", warning);
        }
    }
    if !errors.is_empty() {
        println!();
        println!("❌ {} row(s) skipped:", errors.len());
        for error in errors {
            println!("   {}", error);
        }
    }
}
