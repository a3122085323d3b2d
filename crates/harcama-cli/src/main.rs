//! Harcama CLI - Personal expense tracker
//!
//! Usage:
//!   harcama init                   Initialize database
//!   harcama import --file FILE     Import a CSV, Excel or PDF statement
//!   harcama expenses --limit 20    List recent expenses
//!   harcama stats --months 6       Spending summary
//!   harcama serve --port 8001      Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &config, &file)
        }
        Commands::Expenses { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_expenses(&db, &config, limit)
        }
        Commands::Categories => commands::cmd_categories(&config),
        Commands::Stats { months } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_stats(&db, &config, months)
        }
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &config, &host, port, cli.no_encrypt).await
        }
    }
}
