//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::{parse_category, parse_date_param, read_json};
use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use harcama_core::models::{Expense, ExpenseFilter, ExpenseUpdate, NewExpense};

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub category: Option<String>,
    /// Start date, inclusive (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date, inclusive (YYYY-MM-DD)
    pub to: Option<String>,
}

fn default_limit() -> i64 {
    100
}

/// Request body for creating an expense
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Request body for a partial update
#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Request body for changing only the category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub category: String,
}

/// POST /api/expenses - Create an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let req: CreateExpenseRequest = read_json(request).await?;

    let new = NewExpense {
        title: req.title,
        amount: req.amount,
        category: parse_category(&req.category)?,
        description: req.description,
        date: req.date,
    };
    let expense = state.db.insert_expense(&new).map_err(AppError::from_core)?;

    info!(id = %expense.id, category = %expense.category, "Expense created");
    Ok(Json(expense))
}

/// GET /api/expenses - List expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let filter = ExpenseFilter {
        category: params.category.as_deref().map(parse_category).transpose()?,
        from: params
            .from
            .as_deref()
            .map(|v| parse_date_param("from", v))
            .transpose()?,
        to: params
            .to
            .as_deref()
            .map(|v| parse_date_param("to", v))
            .transpose()?,
    };

    let expenses = state.db.list_expenses(&filter, limit, offset)?;
    Ok(Json(expenses))
}

/// GET /api/expenses/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, AppError> {
    let expense = state
        .db
        .get_expense(&id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    Ok(Json(expense))
}

/// PUT /api/expenses/:id - Update the provided fields of an expense
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let req: UpdateExpenseRequest = read_json(request).await?;

    let update = ExpenseUpdate {
        title: req.title,
        amount: req.amount,
        category: req.category.as_deref().map(parse_category).transpose()?,
        description: req.description,
        date: req.date,
    };
    if update.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let expense = state
        .db
        .update_expense(&id, &update)
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    Ok(Json(expense))
}

/// PUT /api/expenses/:id/category - Recategorize an expense
pub async fn update_expense_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let req: UpdateCategoryRequest = read_json(request).await?;
    let category = parse_category(&req.category)?;

    let expense = state
        .db
        .update_expense_category(&id, category)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    info!(id = %expense.id, category = %category, "Expense recategorized");
    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.db.delete_expense(&id)? {
        return Err(AppError::not_found("Expense not found"));
    }

    Ok(Json(serde_json::json!({
        "message": "Expense deleted successfully"
    })))
}
