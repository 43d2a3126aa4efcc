//! Anomaly detection
//!
//! Two independent signals:
//! - per-transaction: each recent expense is scored against its category's
//!   baseline distribution from a historical window
//! - per-day: each day's total in the recent window is scored against the
//!   distribution of all daily totals in that same window
//!
//! INCOME never contributes to baselines or scores. Categories with fewer
//! than `min_samples` baseline points are left out entirely.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{round2, Category, ExpenseRecord};
use crate::stats::{describe, z_score};

pub const DEFAULT_THRESHOLD: f64 = 2.0;
pub const DEFAULT_MIN_SAMPLES: usize = 5;

const HIGH_SEVERITY_Z: f64 = 3.0;
const MEDIUM_SEVERITY_Z: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Bucket an unrounded z-score by magnitude
    pub fn from_z_score(z: f64) -> Self {
        let magnitude = z.abs();
        if magnitude >= HIGH_SEVERITY_Z {
            Self::High
        } else if magnitude >= MEDIUM_SEVERITY_Z {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Historical amount distribution for one category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBaseline {
    pub category: Category,
    pub sample_amounts: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
}

/// A recent expense that deviates from its category baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub source_id: String,
    pub amount: f64,
    pub category: Category,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub expected_amount: f64,
    pub deviation: f64,
    pub z_score: f64,
    pub severity: Severity,
}

/// A day whose total spend deviates from the window's daily distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusualDay {
    pub date: NaiveDate,
    pub total: f64,
    pub expected_total: f64,
    pub deviation: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineSummary {
    pub category: Category,
    pub average_amount: f64,
    pub standard_deviation: f64,
    pub sample_size: usize,
}

impl From<&CategoryBaseline> for BaselineSummary {
    fn from(baseline: &CategoryBaseline) -> Self {
        Self {
            category: baseline.category,
            average_amount: round2(baseline.mean),
            standard_deviation: round2(baseline.std_dev),
            sample_size: baseline.sample_amounts.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyStatistics {
    pub total_expenses_analyzed: usize,
    pub anomalies_detected: usize,
    pub unusual_days_detected: usize,
    pub threshold: f64,
    pub min_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    pub unusual_days: Vec<UnusualDay>,
    pub baseline_stats: Vec<BaselineSummary>,
    pub statistics: AnomalyStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyOptions {
    /// Minimum |z| that is flagged
    pub threshold: f64,
    /// Minimum baseline points for a category to be scored
    pub min_samples: usize,
}

impl Default for AnomalyOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Split records into the baseline and analysis windows ending at `today`
///
/// The analysis window is `[today - analysis_days, today]`; the baseline is
/// the `baseline_days` immediately before it, excluding the analysis start.
/// Records outside both windows are dropped. Windows reaching past the
/// earliest representable date start at `NaiveDate::MIN`.
pub fn split_windows(
    records: &[ExpenseRecord],
    today: NaiveDate,
    analysis_days: i64,
    baseline_days: i64,
) -> (Vec<ExpenseRecord>, Vec<ExpenseRecord>) {
    let analysis_start = days_before(today, analysis_days);
    let baseline_start = days_before(analysis_start, baseline_days);

    let mut baseline = Vec::new();
    let mut recent = Vec::new();
    for record in records {
        if record.date >= analysis_start && record.date <= today {
            recent.push(record.clone());
        } else if record.date >= baseline_start && record.date < analysis_start {
            baseline.push(record.clone());
        }
    }
    (baseline, recent)
}

fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_sub_days(Days::new(days.max(0).unsigned_abs()))
        .unwrap_or(NaiveDate::MIN)
}

/// Non-INCOME records with a usable amount
fn scorable(records: &[ExpenseRecord]) -> impl Iterator<Item = (&ExpenseRecord, f64)> {
    records.iter().filter(|r| !r.category.is_income()).filter_map(|r| {
        let amount = r.usable_amount();
        if amount.is_none() {
            tracing::debug!(id = %r.id, "Skipping record without a usable amount");
        }
        amount.map(|a| (r, a))
    })
}

/// Build per-category baselines, dropping categories below `min_samples`
pub fn build_baselines(
    baseline_expenses: &[ExpenseRecord],
    min_samples: usize,
) -> BTreeMap<Category, CategoryBaseline> {
    let mut amounts: BTreeMap<Category, Vec<f64>> = BTreeMap::new();
    for (record, amount) in scorable(baseline_expenses) {
        amounts.entry(record.category).or_default().push(amount);
    }

    amounts
        .into_iter()
        .filter_map(|(category, sample_amounts)| {
            if sample_amounts.len() < min_samples {
                tracing::debug!(
                    category = category.as_str(),
                    samples = sample_amounts.len(),
                    "Not enough baseline samples"
                );
                return None;
            }
            let dist = describe(&sample_amounts)?;
            Some((
                category,
                CategoryBaseline {
                    category,
                    mean: dist.mean,
                    std_dev: dist.std_dev,
                    sample_amounts,
                },
            ))
        })
        .collect()
}

/// Score each recent day's total against the window's daily distribution
pub fn detect_unusual_days(recent_expenses: &[ExpenseRecord], threshold: f64) -> Vec<UnusualDay> {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (record, amount) in scorable(recent_expenses) {
        *daily.entry(record.date).or_insert(0.0) += amount;
    }

    let totals: Vec<f64> = daily.values().copied().collect();
    let Some(dist) = describe(&totals) else {
        return Vec::new();
    };

    daily
        .into_iter()
        .filter_map(|(date, total)| {
            let z = z_score(total, dist.mean, dist.std_dev);
            (z.abs() >= threshold).then(|| UnusualDay {
                date,
                total: round2(total),
                expected_total: round2(dist.mean),
                deviation: round2(total - dist.mean),
                z_score: round2(z),
            })
        })
        .collect()
}

/// Detect anomalous recent expenses and unusual days
pub fn detect_anomalies(
    baseline_expenses: &[ExpenseRecord],
    recent_expenses: &[ExpenseRecord],
    options: &AnomalyOptions,
) -> AnomalyReport {
    let baselines = build_baselines(baseline_expenses, options.min_samples);

    let mut analyzed = 0usize;
    let mut anomalies = Vec::new();
    for (record, amount) in scorable(recent_expenses) {
        analyzed += 1;
        let Some(baseline) = baselines.get(&record.category) else {
            continue;
        };
        let z = z_score(amount, baseline.mean, baseline.std_dev);
        if z.abs() >= options.threshold {
            anomalies.push(Anomaly {
                source_id: record.id.clone(),
                amount: round2(amount),
                category: record.category,
                description: record.description.clone(),
                date: record.date,
                expected_amount: round2(baseline.mean),
                deviation: round2(amount - baseline.mean),
                z_score: round2(z),
                severity: Severity::from_z_score(z),
            });
        }
    }

    let unusual_days = detect_unusual_days(recent_expenses, options.threshold);

    tracing::debug!(
        analyzed,
        anomalies = anomalies.len(),
        unusual_days = unusual_days.len(),
        "Anomaly detection complete"
    );

    AnomalyReport {
        statistics: AnomalyStatistics {
            total_expenses_analyzed: analyzed,
            anomalies_detected: anomalies.len(),
            unusual_days_detected: unusual_days.len(),
            threshold: options.threshold,
            min_samples: options.min_samples,
        },
        baseline_stats: baselines.values().map(BaselineSummary::from).collect(),
        anomalies,
        unusual_days,
    }
}
