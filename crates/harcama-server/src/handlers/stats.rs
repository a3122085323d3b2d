//! Statistics handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;
use serde::Deserialize;

use crate::{AppError, AppState};
use harcama_core::models::{ExpenseSummary, MonthlyTotal, PredictionReport, TrendsReport};
use harcama_core::stats::{DEFAULT_MONTHS, MAX_MONTHS};

/// Query parameters for windowed reports
#[derive(Debug, Deserialize)]
pub struct MonthsQuery {
    pub months: Option<u32>,
}

impl MonthsQuery {
    fn window(&self) -> Result<u32, AppError> {
        match self.months {
            None => Ok(DEFAULT_MONTHS),
            Some(months) if (1..=MAX_MONTHS).contains(&months) => Ok(months),
            Some(months) => Err(AppError::bad_request(&format!(
                "months must be between 1 and {}, got {}",
                MAX_MONTHS, months
            ))),
        }
    }
}

/// GET /api/expenses/stats/summary - Totals overall and per category
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExpenseSummary>, AppError> {
    Ok(Json(state.db.expense_summary(&state.catalog)?))
}

/// GET /api/expenses/stats/monthly - Totals for the last N months
pub async fn get_monthly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsQuery>,
) -> Result<Json<Vec<MonthlyTotal>>, AppError> {
    let months = params.window()?;
    let totals = state
        .db
        .monthly_totals(months, Local::now().date_naive())?;
    Ok(Json(totals))
}

/// GET /api/expenses/stats/trends - Per-category totals for the last N months
pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsQuery>,
) -> Result<Json<TrendsReport>, AppError> {
    let months = params.window()?;
    let trends = state
        .db
        .category_trends(months, Local::now().date_naive(), &state.catalog)?;
    Ok(Json(trends))
}

/// GET /api/expenses/stats/predictions - Next month's expected spending
pub async fn get_predictions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PredictionReport>, AppError> {
    let report = state
        .db
        .predictions(Local::now().date_naive(), &state.catalog)?;
    Ok(Json(report))
}
