//! Error types for Harcama

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by storage or I/O
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Import(_) | Error::UnsupportedFile(_) | Error::InvalidData(_) | Error::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
