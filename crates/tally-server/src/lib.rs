//! Tally Web Server
//!
//! Stateless JSON API over tally-core. Callers send the records they have
//! already fetched; nothing is persisted here. Successful responses are
//! wrapped as `{"data": ...}`, failures as `{"error": "..."}`.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tally_core::{AIClient, CompletionProvider, ExpenseParser, TallyConfig};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub parser: ExpenseParser,
    pub config: TallyConfig,
}

impl AppState {
    /// Build state with the default prompt library; the completion client
    /// inherits the configured request timeout
    pub fn new(config: TallyConfig, ai: Option<AIClient>) -> anyhow::Result<Self> {
        let ai = ai.map(|client| client.with_timeout(config.ai.timeout));
        let parser = ExpenseParser::new(ai, config.ai.clone())?;
        Ok(Self { parser, config })
    }
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

pub(crate) fn data<T: Serialize>(value: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data: value })
}

/// Create the application router
pub fn create_router(state: AppState, config: ServerConfig) -> Router {
    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Expenses
        .route("/expenses/parse", post(handlers::parse_expense))
        // Insights
        .route("/insights/trends", post(handlers::get_trends))
        .route("/insights/anomalies", post(handlers::get_anomalies))
        // Analytics
        .route("/analytics/monthly", post(handlers::get_monthly_summary))
        .route("/analytics/categories", post(handlers::get_category_insights))
        // Subscriptions
        .route("/subscriptions/summary", post(handlers::get_subscription_summary))
        .route("/subscriptions/billing", post(handlers::plan_subscription_billing));

    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(
    host: &str,
    port: u16,
    tally_config: TallyConfig,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let ai = AIClient::from_env();
    check_ai_connection(ai.as_ref()).await;

    let state = AppState::new(tally_config, ai)?;
    let app = create_router(state, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log completion backend status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "AI backend connected: {} {} (model: {})",
                    client.backend_name(),
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "AI backend configured but not responding: {} (model: {}); parsing will use the rule-based fallback",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("AI backend not configured (set AI_BACKEND and its host/key); parsing is rule-based only");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<tally_core::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

/// Caller mistakes become 400s with the message; anything else is a 500
/// with a generic body and the detail logged
impl From<tally_core::Error> for AppError {
    fn from(err: tally_core::Error) -> Self {
        match err {
            tally_core::Error::Validation(_) | tally_core::Error::InvalidData(_) => {
                Self::bad_request(&err.to_string())
            }
            err => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                internal: Some(err),
            },
        }
    }
}
