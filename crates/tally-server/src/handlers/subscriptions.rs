//! Subscription summary and billing handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use super::today_or;
use crate::{data, AppError, AppState, DataResponse};
use tally_core::{plan_billing, summarize_subscriptions, BillingPlan, Subscription, SubscriptionSummary};

/// Request body for subscription endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionsRequest {
    pub subscriptions: Vec<Subscription>,
    pub today: Option<NaiveDate>,
    /// Window for the upcoming list (default from config)
    pub upcoming_days: Option<i64>,
}

/// POST /api/subscriptions/summary - Counts, monthly/yearly cost, upcoming billings
pub async fn get_subscription_summary(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubscriptionsRequest>,
) -> Result<Json<DataResponse<SubscriptionSummary>>, AppError> {
    let upcoming_days = body.upcoming_days.unwrap_or(state.config.upcoming_days);
    if upcoming_days < 0 {
        return Err(AppError::bad_request("upcomingDays must not be negative"));
    }

    Ok(data(summarize_subscriptions(
        &body.subscriptions,
        today_or(body.today),
        upcoming_days,
    )))
}

/// POST /api/subscriptions/billing - Reminders, auto-charges and date advances due
pub async fn plan_subscription_billing(
    Json(body): Json<SubscriptionsRequest>,
) -> Json<DataResponse<BillingPlan>> {
    data(plan_billing(&body.subscriptions, today_or(body.today)))
}
