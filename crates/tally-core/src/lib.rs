//! Tally Core Library
//!
//! Shared functionality for the Tally expense tracker:
//! - Natural-language expense parsing with a rule-based fallback
//! - Pluggable completion backends (OpenAI-compatible, Ollama, mock)
//! - Prompt library and learning context from user corrections
//! - Monthly trend and category breakdown analysis
//! - Statistical anomaly detection over spending history
//! - Monthly summaries and subscription billing planning

pub mod ai;
pub mod anomaly;
pub mod config;
pub mod error;
pub mod fallback;
pub mod learning;
pub mod lexicon;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod stats;
pub mod subscriptions;
pub mod summary;
pub mod trends;
pub mod validation;

/// Test utilities including a mock completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIClient, CompletionProvider, CompletionRequest, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use anomaly::{detect_anomalies, Anomaly, AnomalyOptions, AnomalyReport, Severity, UnusualDay};
pub use config::{AiSettings, AnomalySettings, TallyConfig};
pub use error::{Error, Result};
pub use fallback::parse_fallback;
pub use learning::build_learning_context;
pub use models::{Category, ExpenseCandidate, ExpenseRecord, LearningSample};
pub use parser::ExpenseParser;
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use subscriptions::{
    plan_billing, summarize_subscriptions, BillingCycle, BillingPlan, Subscription,
    SubscriptionStatus, SubscriptionSummary,
};
pub use summary::{category_insights, summarize_month, MonthlySummary};
pub use trends::{analyze_trends, TrendDirection, TrendOptions, TrendReport};
