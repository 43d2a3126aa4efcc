//! Expense parsing handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::{data, AppError, AppState, DataResponse};
use tally_core::validation::validate_input;
use tally_core::{ExpenseCandidate, LearningSample};

/// Request body for parsing a note
#[derive(Debug, Deserialize)]
pub struct ParseExpenseRequest {
    pub text: String,
    /// Recent corrections, most recent first
    #[serde(default)]
    pub samples: Vec<LearningSample>,
}

/// POST /api/expenses/parse - Turn a free-text note into an expense candidate
///
/// Never fails because of the completion service; the rule-based parser
/// answers instead and `fallbackUsed` is set.
pub async fn parse_expense(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ParseExpenseRequest>,
) -> Result<Json<DataResponse<ExpenseCandidate>>, AppError> {
    let text = validate_input(&body.text)?;

    let candidate = state.parser.parse(text, &body.samples).await;
    info!(
        category = candidate.category.as_str(),
        confidence = candidate.confidence,
        fallback = candidate.fallback_used,
        "Parsed expense"
    );

    Ok(data(candidate))
}
