//! Runtime configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/tally/config/tally.toml) if it exists
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Override files may be partial; missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::anomaly::AnomalyOptions;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

/// Completion call settings
#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub learning_window: usize,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            temperature: 0.3,
            max_tokens: 500,
            learning_window: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalySettings {
    pub threshold: f64,
    pub min_samples: usize,
    /// Length of the historical window preceding the analysis window
    pub baseline_days: i64,
    /// Length of the recent window being scored
    pub analysis_days: i64,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            min_samples: 5,
            baseline_days: 90,
            analysis_days: 30,
        }
    }
}

impl AnomalySettings {
    pub fn options(&self) -> AnomalyOptions {
        AnomalyOptions {
            threshold: self.threshold,
            min_samples: self.min_samples,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TallyConfig {
    pub ai: AiSettings,
    pub anomaly: AnomalySettings,
    /// Months of history covered by trend reports
    pub trend_months: u32,
    /// Days ahead listed as upcoming subscription billings
    pub upcoming_days: i64,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            ai: AiSettings::default(),
            anomaly: AnomalySettings::default(),
            trend_months: 6,
            upcoming_days: 30,
        }
    }
}

impl TallyConfig {
    /// Load from the default override location, else embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path; a missing file means embedded defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.anomaly.threshold > 0.0) {
            return Err(Error::Config(format!(
                "anomaly.threshold must be positive, got {}",
                self.anomaly.threshold
            )));
        }
        if self.anomaly.analysis_days < 1 || self.anomaly.baseline_days < 1 {
            return Err(Error::Config(format!(
                "anomaly.analysis_days and anomaly.baseline_days must be positive, got {} and {}",
                self.anomaly.analysis_days, self.anomaly.baseline_days
            )));
        }
        if self.ai.timeout.is_zero() {
            return Err(Error::Config("ai.timeout_secs must be positive".to_string()));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(Error::Config(format!(
                "ai.temperature must be between 0 and 2, got {}",
                self.ai.temperature
            )));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("tally.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
    })
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<TallyConfig> {
    let content = match override_path {
        Some(path) if path.exists() => read_config(path)?,
        Some(_) => DEFAULT_CONFIG.to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Using config override");
                read_config(&path)?
            }
            _ => DEFAULT_CONFIG.to_string(),
        },
    };

    let config = parse_config(&content)?;
    config.validate()?;
    Ok(config)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    ai: Option<RawAi>,
    anomaly: Option<RawAnomaly>,
    trends: Option<RawTrends>,
    subscriptions: Option<RawSubscriptions>,
}

#[derive(Debug, Deserialize)]
struct RawAi {
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    learning_window: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawAnomaly {
    threshold: Option<f64>,
    min_samples: Option<usize>,
    baseline_days: Option<i64>,
    analysis_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTrends {
    months: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSubscriptions {
    upcoming_days: Option<i64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<TallyConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = TallyConfig::default();

    if let Some(ai) = raw.ai {
        if let Some(secs) = ai.timeout_secs {
            config.ai.timeout = Duration::from_secs(secs);
        }
        if let Some(temperature) = ai.temperature {
            config.ai.temperature = temperature;
        }
        if let Some(max_tokens) = ai.max_tokens {
            config.ai.max_tokens = max_tokens;
        }
        if let Some(window) = ai.learning_window {
            config.ai.learning_window = window;
        }
    }

    if let Some(anomaly) = raw.anomaly {
        if let Some(threshold) = anomaly.threshold {
            config.anomaly.threshold = threshold;
        }
        if let Some(min_samples) = anomaly.min_samples {
            config.anomaly.min_samples = min_samples;
        }
        if let Some(days) = anomaly.baseline_days {
            config.anomaly.baseline_days = days;
        }
        if let Some(days) = anomaly.analysis_days {
            config.anomaly.analysis_days = days;
        }
    }

    if let Some(months) = raw.trends.and_then(|t| t.months) {
        config.trend_months = months;
    }

    if let Some(days) = raw.subscriptions.and_then(|s| s.upcoming_days) {
        config.upcoming_days = days;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_matches_defaults() {
        let config = TallyConfig::embedded().unwrap();
        assert_eq!(config, TallyConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = parse_config("[anomaly]\nthreshold = 2.5\n").unwrap();
        assert_eq!(config.anomaly.threshold, 2.5);
        assert_eq!(config.anomaly.min_samples, 5);
        assert_eq!(config.ai.timeout, Duration::from_secs(15));
        assert_eq!(config.trend_months, 6);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(parse_config("[ai\n"), Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = parse_config("[anomaly]\nthreshold = 0.0\n").unwrap();
        assert!(config.validate().is_err());

        let config = parse_config("[ai]\ntimeout_secs = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = parse_config("[ai]\ntemperature = 3.5\n").unwrap();
        assert!(config.validate().is_err());

        let config = parse_config("[anomaly]\nbaseline_days = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = parse_config("[anomaly]\nanalysis_days = -30\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "[ai]\ntimeout_secs = 5\nmax_tokens = 200\n").unwrap();

        let config = TallyConfig::load_from(&path).unwrap();
        assert_eq!(config.ai.timeout, Duration::from_secs(5));
        assert_eq!(config.ai.max_tokens, 200);
        assert_eq!(config.ai.temperature, 0.3);
    }

    #[test]
    fn test_load_from_missing_file_uses_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let config = TallyConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "[anomaly]\nthreshold = -1.0\n").unwrap();
        assert!(matches!(TallyConfig::load_from(&path), Err(Error::Config(_))));
    }
}
