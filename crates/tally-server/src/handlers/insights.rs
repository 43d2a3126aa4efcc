//! Trend and anomaly handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use super::today_or;
use crate::{data, AppError, AppState, DataResponse};
use tally_core::anomaly::split_windows;
use tally_core::{
    analyze_trends, detect_anomalies, AnomalyOptions, AnomalyReport, Category, ExpenseRecord,
    TrendOptions, TrendReport,
};

/// Request body for trend analysis
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsRequest {
    pub expenses: Vec<ExpenseRecord>,
    /// Months of history to include (default from config)
    pub months: Option<u32>,
    /// Restrict to one category
    pub category: Option<Category>,
    /// Keep INCOME records in the analysis
    #[serde(default)]
    pub include_income: bool,
    /// End of the window (default today)
    pub today: Option<NaiveDate>,
}

/// POST /api/insights/trends - Monthly totals, direction and category breakdown
pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrendsRequest>,
) -> Result<Json<DataResponse<TrendReport>>, AppError> {
    let months = body.months.unwrap_or(state.config.trend_months);
    if months == 0 {
        return Err(AppError::bad_request("months must be at least 1"));
    }

    let mut options = TrendOptions::last_months(today_or(body.today), months);
    options.category = body.category;
    if body.include_income {
        options.exclude_category = None;
    }

    Ok(data(analyze_trends(&body.expenses, &options)))
}

/// Request body for anomaly detection
///
/// Either `expenses` (split into windows ending at `today`) or explicit
/// `baseline` and `recent` sets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomaliesRequest {
    pub expenses: Option<Vec<ExpenseRecord>>,
    #[serde(default)]
    pub baseline: Vec<ExpenseRecord>,
    #[serde(default)]
    pub recent: Vec<ExpenseRecord>,
    /// Length of the analysis window in days (default from config)
    pub days: Option<i64>,
    pub today: Option<NaiveDate>,
    pub threshold: Option<f64>,
    pub min_samples: Option<usize>,
}

/// POST /api/insights/anomalies - Unusual expenses and unusual days
pub async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnomaliesRequest>,
) -> Result<Json<DataResponse<AnomalyReport>>, AppError> {
    let settings = &state.config.anomaly;
    let options = AnomalyOptions {
        threshold: body.threshold.unwrap_or(settings.threshold),
        min_samples: body.min_samples.unwrap_or(settings.min_samples),
    };
    if !(options.threshold.is_finite() && options.threshold > 0.0) {
        return Err(AppError::bad_request("threshold must be a positive number"));
    }

    let report = match body.expenses {
        Some(expenses) => {
            let days = body.days.unwrap_or(settings.analysis_days);
            if days < 1 {
                return Err(AppError::bad_request("days must be at least 1"));
            }
            let (baseline, recent) =
                split_windows(&expenses, today_or(body.today), days, settings.baseline_days);
            detect_anomalies(&baseline, &recent, &options)
        }
        None => detect_anomalies(&body.baseline, &body.recent, &options),
    };

    Ok(data(report))
}
