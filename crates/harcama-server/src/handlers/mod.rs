//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod categories;
pub mod expenses;
pub mod limits;
pub mod stats;
pub mod uploads;

// Re-export all handlers for use in router
pub use categories::*;
pub use expenses::*;
pub use limits::*;
pub use stats::*;
pub use uploads::*;

use axum::extract::Request;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::AppError;
use harcama_core::Category;

/// Largest JSON body accepted outside of uploads
const MAX_JSON_BODY: usize = 64 * 1024;

/// Read and deserialize a JSON request body
///
/// Malformed bodies are a 400, including values serde rejects.
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_JSON_BODY)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

pub(crate) fn parse_category(value: &str) -> Result<Category, AppError> {
    value
        .parse()
        .map_err(|_| AppError::bad_request(&format!("Invalid category: {}", value)))
}

/// Parse a `YYYY-MM-DD` parameter
pub(crate) fn parse_date_param(name: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::bad_request(&format!("Invalid {} date: {} (expected YYYY-MM-DD)", name, value))
    })
}
