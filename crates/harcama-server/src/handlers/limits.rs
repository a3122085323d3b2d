//! Monthly category limit handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::{parse_category, read_json};
use crate::{AppError, AppState};
use harcama_core::models::{CategoryLimit, LimitCheck};

/// Request body for setting a limit
#[derive(Debug, Deserialize)]
pub struct SetLimitRequest {
    pub category: String,
    pub amount: f64,
    /// `YYYY-MM`, defaults to the current month
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub month: Option<String>,
}

/// POST /api/expenses/limits - Create or replace a monthly category limit
pub async fn set_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<CategoryLimit>, AppError> {
    let req: SetLimitRequest = read_json(request).await?;
    let category = parse_category(&req.category)?;

    let limit = state
        .db
        .set_limit(category, req.month.as_deref(), req.amount)
        .map_err(AppError::from_core)?;

    info!(category = %limit.category, month = %limit.month, amount = limit.amount, "Limit set");
    Ok(Json(limit))
}

/// GET /api/expenses/limits/check - Spending against each limit of a month
pub async fn check_limits(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<LimitCheck>>, AppError> {
    let checks = state
        .db
        .check_limits(params.month.as_deref(), &state.catalog)
        .map_err(AppError::from_core)?;
    Ok(Json(checks))
}
