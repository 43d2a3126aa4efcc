//! Mock backend for testing
//!
//! By default it answers like a well-behaved model: the first number in the
//! user prompt becomes the amount and the category comes from the keyword
//! lexicon. Tests can instead pin the reply text, force a failure, or delay
//! the reply to exercise timeouts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::fallback::FallbackRule;
use crate::lexicon::guess_category;

use super::{CompletionProvider, CompletionRequest};

#[derive(Debug, Clone, Default)]
enum MockReply {
    #[default]
    Echo,
    Text(String),
    Fail(String),
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Default::default()
        }
    }

    /// Always reply with `text`
    pub fn with_reply(text: &str) -> Self {
        Self {
            reply: MockReply::Text(text.to_string()),
            ..Self::new()
        }
    }

    /// Every call fails with a completion error
    pub fn failing(message: &str) -> Self {
        Self {
            reply: MockReply::Fail(message.to_string()),
            ..Self::new()
        }
    }

    /// Wait before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls made so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Reply a cooperative model would give for the note
fn echo_reply(user_prompt: &str) -> String {
    let (amount, description) = match FallbackRule::BareNumber.extract(user_prompt) {
        Some(extraction) => (extraction.amount, extraction.description),
        None => (0.0, user_prompt.trim().to_string()),
    };
    serde_json::json!({
        "amount": amount,
        "category": guess_category(&description).as_str(),
        "description": description,
    })
    .to_string()
}

#[async_trait]
impl CompletionProvider for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            MockReply::Echo => Ok(echo_reply(&request.user_prompt)),
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::Completion(message.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
