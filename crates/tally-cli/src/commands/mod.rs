//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `parse` - Natural-language expense parsing
//! - `insights` - Trend and anomaly reports
//! - `analytics` - Monthly summary and category shares
//! - `subscriptions` - Subscription summary and billing plan
//! - `ai` - Completion backend diagnostics
//! - `serve` - Web server command

pub mod ai;
pub mod analytics;
pub mod insights;
pub mod parse;
pub mod serve;
pub mod subscriptions;

// Re-export command functions for main.rs
pub use ai::*;
pub use analytics::*;
pub use insights::*;
pub use parse::*;
pub use serve::*;
pub use subscriptions::*;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tally_core::TallyConfig;

/// Load config from an explicit path or the default locations
pub fn load_config(path: Option<&Path>) -> Result<TallyConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            TallyConfig::load_from(path)
        }
        None => TallyConfig::load(),
    };
    config.context("Failed to load configuration")
}

/// Read a JSON document (usually an array of records) from a file
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Parse an optional YYYY-MM-DD argument, defaulting to today
pub fn parse_today(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shorten text for table output without splitting a character
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
