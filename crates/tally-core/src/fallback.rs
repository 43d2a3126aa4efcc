//! Rule-based fallback parser
//!
//! Deterministic extractor used when the completion service is unavailable
//! or misbehaves. It is a total function: every input yields a candidate.
//!
//! Rules are tried in order and the first that matches wins:
//!
//! 1. [`FallbackRule::BareNumber`]: the first decimal numeral anywhere in the
//!    text is the amount; the rest of the text is the description.
//! 2. [`FallbackRule::SpendingPhrase`]: "spent/paid 150 for lunch" style
//!    phrasing. Any text this rule accepts also contains a numeral, so rule 1
//!    always matches first and this rule never runs from [`parse_fallback`].
//!    It is kept in the table so the intended ordering question stays visible.

use std::sync::LazyLock;

use regex::Regex;

use crate::lexicon::guess_category;
use crate::models::{Category, ExpenseCandidate};

/// Confidence reported when a rule extracted an amount
pub const FALLBACK_CONFIDENCE: u8 = 50;

/// Confidence reported when nothing could be extracted
pub const UNPARSED_CONFIDENCE: u8 = 30;

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)").expect("valid bare number regex"));

static SPENDING_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:花了|支付|付了|spent|paid)?\s*([0-9]+(?:\.[0-9]+)?)\s*(?:元|塊|dollars?)?\s*(?:買|on|for)?\s*(.+)",
    )
    .expect("valid spending phrase regex")
});

/// A single extraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackRule {
    BareNumber,
    SpendingPhrase,
}

/// Amount and description pulled out of raw text by a rule
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub amount: f64,
    pub description: String,
}

/// Rules in evaluation order
pub const RULES: &[FallbackRule] = &[FallbackRule::BareNumber, FallbackRule::SpendingPhrase];

impl FallbackRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BareNumber => "bare_number",
            Self::SpendingPhrase => "spending_phrase",
        }
    }

    /// Apply the rule to raw input
    pub fn extract(&self, input: &str) -> Option<Extraction> {
        match self {
            Self::BareNumber => {
                let numeral = BARE_NUMBER.captures(input)?.get(1)?;
                let amount = numeral.as_str().parse::<f64>().ok()?;
                let description = input.replacen(numeral.as_str(), "", 1).trim().to_string();
                Some(Extraction {
                    amount,
                    description,
                })
            }
            Self::SpendingPhrase => {
                let captures = SPENDING_PHRASE.captures(input)?;
                let amount = captures.get(1)?.as_str().parse::<f64>().ok()?;
                let description = captures
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                Some(Extraction {
                    amount,
                    description,
                })
            }
        }
    }
}

/// Parse free text into an expense candidate without any external service
pub fn parse_fallback(input: &str) -> ExpenseCandidate {
    for rule in RULES {
        if let Some(extraction) = rule.extract(input) {
            tracing::debug!(rule = rule.as_str(), amount = extraction.amount, "Fallback rule matched");
            let category = guess_category(&extraction.description);
            return ExpenseCandidate {
                amount: extraction.amount,
                category,
                description: extraction.description,
                confidence: FALLBACK_CONFIDENCE,
                fallback_used: true,
            };
        }
    }

    ExpenseCandidate {
        amount: 0.0,
        category: Category::Other,
        description: input.to_string(),
        confidence: UNPARSED_CONFIDENCE,
        fallback_used: true,
    }
}
