//! Service root and category definitions

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::AppState;
use harcama_core::models::CategoryDefinition;

/// GET /api - Service banner
pub async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Expense Tracker API" }))
}

/// GET /api/categories - Category ids with display name, color and icon
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryDefinition>> {
    Json(state.catalog.definitions())
}
