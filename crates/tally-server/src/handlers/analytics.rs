//! Monthly summary and category insight handlers

use axum::Json;
use serde::Deserialize;

use crate::{data, AppError, DataResponse};
use tally_core::summary::{category_insights, parse_month_key, summarize_month, CategoryInsight};
use tally_core::{ExpenseRecord, MonthlySummary};

/// Request body for a monthly summary
#[derive(Debug, Deserialize)]
pub struct MonthlyRequest {
    pub expenses: Vec<ExpenseRecord>,
    /// `YYYY-MM`
    pub month: String,
}

/// POST /api/analytics/monthly - Totals, category split, daily totals, top expenses
pub async fn get_monthly_summary(
    Json(body): Json<MonthlyRequest>,
) -> Result<Json<DataResponse<MonthlySummary>>, AppError> {
    let (year, month) = parse_month_key(&body.month)?;
    Ok(data(summarize_month(&body.expenses, year, month)))
}

#[derive(Debug, Deserialize)]
pub struct CategoriesRequest {
    pub expenses: Vec<ExpenseRecord>,
}

/// POST /api/analytics/categories - Per-category spending share
pub async fn get_category_insights(
    Json(body): Json<CategoriesRequest>,
) -> Json<DataResponse<Vec<CategoryInsight>>> {
    data(category_insights(&body.expenses))
}
