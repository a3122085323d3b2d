//! Harcama Core Library
//!
//! Shared functionality for the Harcama expense tracker:
//! - Expense store (SQLite, optionally SQLCipher-encrypted)
//! - Statement ingestion pipeline for CSV, spreadsheet and PDF exports
//! - Import configuration (keywords, column synonyms, thresholds)
//! - Statistics, predictions and monthly category limits

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod stats;

pub use config::{CategoryCatalog, ImportConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use import::{ExpenseStore, ImportOutcome, ImportPipeline, ImportSummary, StatementSummary};
pub use models::{Category, Expense, ExpenseFilter, ExpenseUpdate, NewExpense};
