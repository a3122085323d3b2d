//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use harcama_core::ImportConfig;
use harcama_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    config: &ImportConfig,
    host: &str,
    port: u16,
    no_encrypt: bool,
) -> Result<()> {
    println!("🚀 Starting Harcama web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}/api", host, port);

    let server_config = ServerConfig::from_env();
    if server_config.allowed_origins.is_empty() {
        println!("   🔒 CORS: same-origin only");
        println!("      Set HARCAMA_ALLOWED_ORIGINS to allow a frontend origin");
    } else {
        println!(
            "   🌐 CORS origins: {}",
            server_config.allowed_origins.join(", ")
        );
    }

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }

    let db = open_db(db_path, no_encrypt)?;

    harcama_server::serve_with_config(db, config, host, port, server_config)
        .await
        .context("Server error")
}
