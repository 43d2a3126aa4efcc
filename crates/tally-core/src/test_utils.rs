//! Test utilities for tally-core
//!
//! A mock completion server speaking both the OpenAI chat completions and
//! the Ollama chat protocols, for integration tests of the HTTP backends
//! and the parser's fallback path.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::fallback::FallbackRule;
use crate::lexicon::guess_category;

#[derive(Debug, Clone)]
enum ServerMode {
    /// Answer like a cooperative model
    Echo,
    /// Always answer with this content
    Reply(String),
    /// Answer every completion with a 503
    Failing,
    /// Echo after sleeping
    Slow(Duration),
}

struct ServerState {
    mode: ServerMode,
    requests: Mutex<Vec<Value>>,
}

type SharedState = Arc<ServerState>;

/// Mock completion server for testing and development
pub struct MockCompletionServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCompletionServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with_mode(ServerMode::Echo).await
    }

    /// Every completion returns `content` verbatim
    pub async fn start_with_reply(content: &str) -> Self {
        Self::start_with_mode(ServerMode::Reply(content.to_string())).await
    }

    /// Completions fail with 503; health endpoints stay up
    pub async fn start_failing() -> Self {
        Self::start_with_mode(ServerMode::Failing).await
    }

    /// Completions are delayed by `delay`
    pub async fn start_slow(delay: Duration) -> Self {
        Self::start_with_mode(ServerMode::Slow(delay)).await
    }

    async fn start_with_mode(mode: ServerMode) -> Self {
        let state = Arc::new(ServerState {
            mode,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .route("/api/tags", get(handle_tags))
            .route("/api/chat", post(handle_ollama_chat))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Last user message in a chat request
fn user_message(body: &Value) -> String {
    body["messages"]
        .as_array()
        .and_then(|messages| messages.iter().rev().find(|m| m["role"] == "user"))
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Reply content for a request, or None when the mode says to fail
async fn reply_for(state: &ServerState, body: Value) -> Option<String> {
    let note = user_message(&body);
    state.requests.lock().unwrap().push(body);

    match &state.mode {
        ServerMode::Failing => None,
        ServerMode::Reply(content) => Some(content.clone()),
        ServerMode::Echo => Some(echo_content(&note)),
        ServerMode::Slow(delay) => {
            tokio::time::sleep(*delay).await;
            Some(echo_content(&note))
        }
    }
}

fn echo_content(note: &str) -> String {
    let (amount, description) = match FallbackRule::BareNumber.extract(note) {
        Some(extraction) => (extraction.amount, extraction.description),
        None => (0.0, note.trim().to_string()),
    };
    json!({
        "amount": amount,
        "category": guess_category(&description).as_str(),
        "description": description,
    })
    .to_string()
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": {"message": "model overloaded"}})),
    )
        .into_response()
}

async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{"id": "mock-model", "object": "model"}]
    }))
}

async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{"name": "llama3.2:latest", "size": 2_000_000_000u64}]
    }))
}

async fn handle_chat_completions(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Response {
    let model = body["model"].clone();
    match reply_for(&state, body).await {
        Some(content) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        None => unavailable(),
    }
}

async fn handle_ollama_chat(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let model = body["model"].clone();
    match reply_for(&state, body).await {
        Some(content) => Json(json!({
            "model": model,
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": content},
            "done": true
        }))
        .into_response(),
        None => unavailable(),
    }
}
