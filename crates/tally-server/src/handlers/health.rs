//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{data, AppState, DataResponse};
use tally_core::CompletionProvider;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStatus {
    pub configured: bool,
    pub available: bool,
    pub backend: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub ai: AiStatus,
}

/// GET /api/health - Server status and a live completion backend check
pub async fn health(State(state): State<Arc<AppState>>) -> Json<DataResponse<HealthStatus>> {
    let ai = match state.parser.provider() {
        Some(client) => AiStatus {
            configured: true,
            available: client.health_check().await,
            backend: Some(client.backend_name().to_string()),
            model: Some(client.model().to_string()),
        },
        None => AiStatus {
            configured: false,
            available: false,
            backend: None,
            model: None,
        },
    };

    data(HealthStatus { status: "ok", ai })
}
