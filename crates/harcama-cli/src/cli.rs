//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Harcama - Track expenses and import bank statements
#[derive(Parser)]
#[command(name = "harcama")]
#[command(about = "Personal expense tracker with bank statement import", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, env = "HARCAMA_DB", default_value = "harcama.db", global = true)]
    pub db: PathBuf,

    /// Import configuration override (TOML)
    ///
    /// Falls back to HARCAMA_CONFIG, then the user data directory, then the
    /// built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set HARCAMA_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import a bank statement (CSV, Excel or PDF)
    Import {
        /// Statement file; the format is picked from the extension
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List recent expenses
    Expenses {
        /// Number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show category definitions
    Categories,

    /// Show spending summary and monthly totals
    Stats {
        /// Number of months to include
        #[arg(short, long, default_value = "6")]
        months: u32,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8001")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
