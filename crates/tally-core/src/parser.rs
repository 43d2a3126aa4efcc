//! Natural-language expense parser
//!
//! Sends the note to the completion service with the user's correction
//! history and scores the structured reply. Any failure on that path (no
//! backend, transport error, deadline, bad payload) is logged and answered
//! by the rule-based parser instead, so [`ExpenseParser::parse`] never fails.
//!
//! Dropping the future returned by `parse` drops the in-flight HTTP request
//! with it; nothing needs rolling back.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::ai::parsing::{parse_expense_response, ParsedExpense};
use crate::ai::{AIClient, CompletionProvider, CompletionRequest};
use crate::config::AiSettings;
use crate::error::{Error, Result};
use crate::fallback::parse_fallback;
use crate::learning::build_learning_context_with_window;
use crate::models::{Category, ExpenseCandidate, LearningSample};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

const BASE_CONFIDENCE: u32 = 50;

/// Additive confidence heuristic for a completion result
///
/// A ranking signal, not a probability: 50 base, +20 positive amount,
/// +15 category present, +10 non-empty description, +5 description found
/// verbatim in the input, capped at 100.
pub fn score_confidence(parsed: &ParsedExpense, input: &str) -> u8 {
    let mut confidence = BASE_CONFIDENCE;
    if parsed.amount > 0.0 {
        confidence += 20;
    }
    // The schema check guarantees a category
    confidence += 15;
    if !parsed.description.is_empty() {
        confidence += 10;
        if input.contains(&parsed.description) {
            confidence += 5;
        }
    }
    confidence.min(100) as u8
}

/// Category list rendered into the system prompt
pub fn category_menu() -> String {
    Category::all()
        .iter()
        .map(|c| format!("   - {} ({})", c.as_str(), c.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ExpenseParser<P = AIClient> {
    provider: Option<P>,
    prompt: Prompt,
    settings: AiSettings,
}

impl<P: CompletionProvider> ExpenseParser<P> {
    /// Load the prompt from the default library (override dir, then embedded)
    pub fn new(provider: Option<P>, settings: AiSettings) -> Result<Self> {
        Self::with_library(provider, settings, &mut PromptLibrary::new())
    }

    pub fn with_library(
        provider: Option<P>,
        settings: AiSettings,
        library: &mut PromptLibrary,
    ) -> Result<Self> {
        let prompt = library.get(PromptId::ParseExpense)?.clone();
        Ok(Self {
            provider,
            prompt,
            settings,
        })
    }

    /// Embedded prompt only; used by tests and when overrides must be ignored
    pub fn embedded(provider: Option<P>, settings: AiSettings) -> Result<Self> {
        Self::with_library(provider, settings, &mut PromptLibrary::embedded_only())
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    /// Build the completion request for a note
    pub fn build_request(&self, input: &str, samples: &[LearningSample]) -> CompletionRequest {
        let learning_context =
            build_learning_context_with_window(samples, self.settings.learning_window);
        let categories = category_menu();

        let mut vars = HashMap::new();
        vars.insert("categories", categories.as_str());
        vars.insert("learning_context", learning_context.as_str());
        vars.insert("input", input);

        let system = self.prompt.render_system(&vars);
        let user = self
            .prompt
            .render_user(&vars)
            .unwrap_or_else(|| input.to_string());

        CompletionRequest::new(system, user)
            .json()
            .with_sampling(self.settings.temperature, self.settings.max_tokens)
    }

    /// Parse a note into a candidate; falls back to rules on any failure
    pub async fn parse(&self, input: &str, samples: &[LearningSample]) -> ExpenseCandidate {
        let Some(provider) = self.provider.as_ref() else {
            debug!("No completion backend configured, using rule-based parser");
            return parse_fallback(input);
        };

        match self.parse_with(provider, input, samples).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(error = %e, model = provider.model(), "AI parsing failed, using fallback");
                parse_fallback(input)
            }
        }
    }

    /// The completion path alone, with its error surfaced
    pub async fn parse_with(
        &self,
        provider: &P,
        input: &str,
        samples: &[LearningSample],
    ) -> Result<ExpenseCandidate> {
        let request = self.build_request(input, samples);

        let text = tokio::time::timeout(self.settings.timeout, provider.complete(&request))
            .await
            .map_err(|_| Error::Timeout(self.settings.timeout))??;

        let parsed = parse_expense_response(&text)?;
        let confidence = score_confidence(&parsed, input);
        debug!(
            category = parsed.category.as_str(),
            amount = parsed.amount,
            confidence,
            "AI parse succeeded"
        );

        Ok(ExpenseCandidate {
            amount: parsed.amount,
            category: parsed.category,
            description: parsed.description,
            confidence,
            fallback_used: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::ai::MockBackend;
    use crate::fallback::{FALLBACK_CONFIDENCE, UNPARSED_CONFIDENCE};

    fn settings() -> AiSettings {
        AiSettings {
            timeout: Duration::from_millis(200),
            ..AiSettings::default()
        }
    }

    fn parser(backend: MockBackend) -> ExpenseParser<MockBackend> {
        ExpenseParser::embedded(Some(backend), settings()).unwrap()
    }

    fn parsed(amount: f64, description: &str) -> ParsedExpense {
        ParsedExpense {
            amount,
            category: Category::Food,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_confidence_heuristic() {
        assert_eq!(score_confidence(&parsed(150.0, "午餐"), "午餐 150"), 100);
        assert_eq!(score_confidence(&parsed(150.0, "lunch"), "午餐 150"), 95);
        assert_eq!(score_confidence(&parsed(150.0, ""), "午餐 150"), 85);
        assert_eq!(score_confidence(&parsed(0.0, ""), "午餐"), 65);
    }

    #[tokio::test]
    async fn test_ai_success() {
        let backend = MockBackend::with_reply(
            r#"{"amount": 150, "category": "FOOD", "description": "午餐"}"#,
        );
        let candidate = parser(backend).parse("午餐 150", &[]).await;
        assert_eq!(candidate.amount, 150.0);
        assert_eq!(candidate.category, Category::Food);
        assert_eq!(candidate.confidence, 100);
        assert!(!candidate.fallback_used);
    }

    #[tokio::test]
    async fn test_service_error_falls_back() {
        let backend = MockBackend::failing("503 Service Unavailable");
        let parser = parser(backend.clone());
        let candidate = parser.parse("午餐 150", &[]).await;
        assert!(candidate.fallback_used);
        assert_eq!(candidate.category, Category::Food);
        assert_eq!(candidate.confidence, FALLBACK_CONFIDENCE);
        // One attempt, no retries
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        for reply in ["", "I think it's food", r#"{"category": "FOOD"}"#, r#"{"amount": 1, "category": "PETS"}"#] {
            let candidate = parser(MockBackend::with_reply(reply)).parse("taxi 250", &[]).await;
            assert!(candidate.fallback_used, "reply {:?}", reply);
            assert_eq!(candidate.amount, 250.0);
            assert_eq!(candidate.category, Category::Transport);
        }
    }

    #[tokio::test]
    async fn test_deadline_falls_back() {
        let backend = MockBackend::new().with_delay(Duration::from_secs(5));
        let parser = parser(backend);
        let err = parser
            .parse_with(parser.provider().unwrap(), "coffee 3.5", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));

        let candidate = parser.parse("coffee 3.5", &[]).await;
        assert!(candidate.fallback_used);
        assert_eq!(candidate.amount, 3.5);
    }

    #[tokio::test]
    async fn test_no_backend_uses_rules() {
        let parser: ExpenseParser<MockBackend> = ExpenseParser::embedded(None, settings()).unwrap();
        let candidate = parser.parse("nothing useful", &[]).await;
        assert!(candidate.fallback_used);
        assert_eq!(candidate.confidence, UNPARSED_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_echo_backend_round_trip() {
        let candidate = parser(MockBackend::new()).parse("Netflix 390", &[]).await;
        assert!(!candidate.fallback_used);
        assert_eq!(candidate.category, Category::Subscription);
        assert_eq!(candidate.description, "Netflix");
        assert_eq!(candidate.confidence, 100);
    }

    #[test]
    fn test_build_request() {
        let parser = parser(MockBackend::new());
        let samples = vec![LearningSample {
            original_input: "Costco 2300".to_string(),
            corrected_category: Category::Shopping,
            corrected_amount: Some(2300.0),
            corrected_description: Some("Costco".to_string()),
            created_at: Utc::now(),
        }];
        let request = parser.build_request("午餐 150", &samples);

        assert!(request.json_response);
        assert_eq!(request.max_tokens, 500);
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.user_prompt, "午餐 150");
        assert!(request.system_prompt.contains("SUBSCRIPTION (Subscriptions)"));
        assert!(request.system_prompt.contains("Costco 2300"));
        assert!(!request.system_prompt.contains("{{"));
    }

    #[test]
    fn test_build_request_without_history() {
        let request = parser(MockBackend::new()).build_request("taxi 250", &[]);
        assert!(request
            .system_prompt
            .contains(crate::learning::NO_HISTORY_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_candidates_stay_in_bounds() {
        for reply in [
            r#"{"amount": 99999999, "category": "income", "description": "bonus"}"#,
            r#"{"amount": 0, "category": "OTHER", "description": ""}"#,
        ] {
            let candidate = parser(MockBackend::with_reply(reply)).parse("bonus 99999999", &[]).await;
            assert!(candidate.confidence <= 100);
            assert!(Category::all().contains(&candidate.category));
        }
    }
}
