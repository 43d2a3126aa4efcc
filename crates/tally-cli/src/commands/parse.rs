//! Expense parsing command

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::validation::{validate_candidate, validate_input};
use tally_core::{AIClient, ExpenseCandidate, ExpenseParser, LearningSample, TallyConfig};

use super::{print_json, read_json_file};

/// Build a parser from the environment, or rule-based only when `offline`
pub fn build_parser(config: &TallyConfig, offline: bool) -> Result<ExpenseParser> {
    let ai = if offline {
        None
    } else {
        AIClient::from_env().map(|client| client.with_timeout(config.ai.timeout))
    };
    ExpenseParser::new(ai, config.ai.clone()).context("Failed to load parse prompt")
}

pub async fn cmd_parse(
    config: &TallyConfig,
    text: &str,
    samples_path: Option<&Path>,
    offline: bool,
    json: bool,
) -> Result<()> {
    let text = validate_input(text)?;
    let samples: Vec<LearningSample> = match samples_path {
        Some(path) => read_json_file(path)?,
        None => Vec::new(),
    };

    let parser = build_parser(config, offline)?;
    let candidate = parser.parse(text, &samples).await;

    if json {
        return print_json(&candidate);
    }
    print_candidate(&candidate);
    Ok(())
}

pub fn print_candidate(candidate: &ExpenseCandidate) {
    println!("💰 Amount:      {:.2}", candidate.amount);
    println!(
        "🏷️  Category:    {} ({})",
        candidate.category,
        candidate.category.label()
    );
    if !candidate.description.is_empty() {
        println!("📝 Description: {}", candidate.description);
    }
    println!("📊 Confidence:  {}", candidate.confidence);
    if candidate.fallback_used {
        println!("   (rule-based fallback; completion service unavailable or rejected)");
    }
    if let Err(e) = validate_candidate(candidate) {
        println!("⚠️  Needs correction before saving: {}", e);
    }
}
