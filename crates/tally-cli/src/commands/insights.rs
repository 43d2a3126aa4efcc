//! Trend and anomaly report commands

use std::path::{Path, PathBuf};

use anyhow::Result;
use tally_core::anomaly::split_windows;
use tally_core::{
    analyze_trends, detect_anomalies, Category, ExpenseRecord, TallyConfig, TrendOptions,
};

use super::{parse_today, print_json, read_json_file, truncate};

pub fn cmd_trends(
    config: &TallyConfig,
    file: &Path,
    category: Option<&str>,
    include_income: bool,
    months: Option<u32>,
    today: Option<&str>,
    json: bool,
) -> Result<()> {
    let months = months.unwrap_or(config.trend_months);
    if months == 0 {
        anyhow::bail!("--months must be at least 1");
    }
    let category = category
        .map(|c| c.parse::<Category>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let expenses: Vec<ExpenseRecord> = read_json_file(file)?;
    let mut options = TrendOptions::last_months(parse_today(today)?, months);
    options.category = category;
    if include_income {
        options.exclude_category = None;
    }

    let report = analyze_trends(&expenses, &options);

    if json {
        return print_json(&report);
    }

    println!("📈 Spending trends (last {} months)\n", months);
    if report.points.is_empty() {
        println!("   No expenses in range.");
        return Ok(());
    }

    println!("   {:<8} {:>12} {:>6} {:>10} {:>9}", "Month", "Total", "Count", "Average", "Change");
    for point in &report.points {
        println!(
            "   {:<8} {:>12.2} {:>6} {:>10.2} {:>8.1}%",
            point.month, point.total, point.count, point.average, point.change_percent
        );
    }
    println!();
    println!("   Direction:       {}", report.direction);
    println!("   Monthly average: {:.2}", report.average_monthly);
    println!("   Total spent:     {:.2}", report.total_spent);

    if !report.category_breakdown.is_empty() {
        println!("\n   By category:");
        for share in &report.category_breakdown {
            println!(
                "   {:<14} {:>12.2} {:>6.1}%",
                share.category.as_str(),
                share.total,
                share.percentage
            );
        }
    }

    Ok(())
}

/// Where anomaly input comes from
pub enum AnomalySource {
    /// Full history split into baseline and analysis windows
    History {
        file: PathBuf,
        days: Option<i64>,
        today: Option<String>,
    },
    Explicit {
        baseline: PathBuf,
        recent: PathBuf,
    },
}

pub fn cmd_anomalies(
    config: &TallyConfig,
    source: AnomalySource,
    threshold: Option<f64>,
    min_samples: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut options = config.anomaly.options();
    if let Some(t) = threshold {
        if !(t.is_finite() && t > 0.0) {
            anyhow::bail!("--threshold must be a positive number");
        }
        options.threshold = t;
    }
    if let Some(n) = min_samples {
        options.min_samples = n;
    }

    let (baseline, recent) = match source {
        AnomalySource::History { file, days, today } => {
            let days = days.unwrap_or(config.anomaly.analysis_days);
            if days < 1 {
                anyhow::bail!("--days must be at least 1");
            }
            let expenses: Vec<ExpenseRecord> = read_json_file(&file)?;
            split_windows(
                &expenses,
                parse_today(today.as_deref())?,
                days,
                config.anomaly.baseline_days,
            )
        }
        AnomalySource::Explicit { baseline, recent } => {
            (read_json_file(&baseline)?, read_json_file(&recent)?)
        }
    };

    let report = detect_anomalies(&baseline, &recent, &options);

    if json {
        return print_json(&report);
    }

    let stats = &report.statistics;
    println!(
        "🔍 Analyzed {} expenses (threshold {:.1}σ, min {} samples)\n",
        stats.total_expenses_analyzed, stats.threshold, stats.min_samples
    );

    if report.anomalies.is_empty() {
        println!("   ✅ No unusual expenses.");
    } else {
        println!("   ⚠️  Unusual expenses:");
        for anomaly in &report.anomalies {
            println!(
                "   {} {:<14} {:>10.2} (expected {:.2}, z {:+.2}, {}) {}",
                anomaly.date,
                anomaly.category.as_str(),
                anomaly.amount,
                anomaly.expected_amount,
                anomaly.z_score,
                anomaly.severity,
                truncate(anomaly.description.as_deref().unwrap_or(""), 30)
            );
        }
    }

    if !report.unusual_days.is_empty() {
        println!("\n   📅 Unusual days:");
        for day in &report.unusual_days {
            println!(
                "   {} {:>10.2} (expected {:.2}, z {:+.2})",
                day.date, day.total, day.expected_total, day.z_score
            );
        }
    }

    if !report.baseline_stats.is_empty() {
        println!("\n   Baselines:");
        for baseline in &report.baseline_stats {
            println!(
                "   {:<14} avg {:>10.2}  sd {:>8.2}  n={}",
                baseline.category.as_str(),
                baseline.average_amount,
                baseline.standard_deviation,
                baseline.sample_size
            );
        }
    }

    Ok(())
}
