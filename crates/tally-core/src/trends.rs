//! Monthly spending trends
//!
//! Buckets expense records by calendar month, computes month-over-month
//! change, and classifies the recent direction.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{round2, Category, ExpenseRecord};

/// Direction of the most recent month-over-month movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One calendar month of spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub change_percent: f64,
}

/// A category's share of the analyzed spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: Category,
    pub total: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub points: Vec<MonthlyTrendPoint>,
    pub direction: TrendDirection,
    pub average_monthly: f64,
    pub total_spent: f64,
    pub last_month_total: f64,
    pub category_breakdown: Vec<CategoryShare>,
}

/// Record selection for [`analyze_trends`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrendOptions {
    /// Category dropped before grouping (INCOME by default)
    pub exclude_category: Option<Category>,
    /// Restrict the analysis to one category
    pub category: Option<Category>,
    /// Inclusive date bounds
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            exclude_category: Some(Category::Income),
            category: None,
            since: None,
            until: None,
        }
    }
}

impl TrendOptions {
    /// Records dated from `months` calendar months before `today` through `today`
    pub fn last_months(today: NaiveDate, months: u32) -> Self {
        Self {
            since: Some(today.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)),
            until: Some(today),
            ..Self::default()
        }
    }

    fn accepts(&self, record: &ExpenseRecord) -> bool {
        if self.exclude_category == Some(record.category) {
            return false;
        }
        if self.category.is_some_and(|c| c != record.category) {
            return false;
        }
        if self.since.is_some_and(|d| record.date < d) {
            return false;
        }
        if self.until.is_some_and(|d| record.date > d) {
            return false;
        }
        true
    }
}

/// `YYYY-MM` key for a date
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Analyze monthly spending trends
pub fn analyze_trends(expenses: &[ExpenseRecord], options: &TrendOptions) -> TrendReport {
    let mut months: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut categories: BTreeMap<Category, f64> = BTreeMap::new();

    for record in expenses.iter().filter(|r| options.accepts(r)) {
        let Some(amount) = record.usable_amount() else {
            tracing::debug!(id = %record.id, "Skipping record without a usable amount");
            continue;
        };
        let bucket = months.entry(month_key(record.date)).or_insert((0.0, 0));
        bucket.0 += amount;
        bucket.1 += 1;
        *categories.entry(record.category).or_insert(0.0) += amount;
    }

    // BTreeMap iteration is already ascending by `YYYY-MM`
    let mut points: Vec<MonthlyTrendPoint> = Vec::with_capacity(months.len());
    for (month, (sum, count)) in months {
        let total = round2(sum);
        let change_percent = match points.last() {
            Some(prev) if prev.total > 0.0 => round2((total - prev.total) / prev.total * 100.0),
            _ => 0.0,
        };
        points.push(MonthlyTrendPoint {
            month,
            total,
            count,
            average: round2(sum / count as f64),
            change_percent,
        });
    }

    let direction = match points.as_slice() {
        [.., prev, last] => {
            if last.total > prev.total {
                TrendDirection::Increasing
            } else {
                TrendDirection::Decreasing
            }
        }
        _ => TrendDirection::Stable,
    };

    let total_spent: f64 = points.iter().map(|p| p.total).sum();
    let average_monthly = if points.is_empty() {
        0.0
    } else {
        round2(total_spent / points.len() as f64)
    };
    let last_month_total = points.last().map(|p| p.total).unwrap_or(0.0);

    let mut category_breakdown: Vec<CategoryShare> = categories
        .into_iter()
        .map(|(category, total)| CategoryShare {
            category,
            total: round2(total),
            percentage: if total_spent > 0.0 {
                round2(total / total_spent * 100.0)
            } else {
                0.0
            },
        })
        .collect();
    // Stable sort keeps declaration order for equal totals
    category_breakdown.sort_by(|a, b| b.total.total_cmp(&a.total));

    TrendReport {
        points,
        direction,
        average_monthly,
        total_spent: round2(total_spent),
        last_month_total,
        category_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64, category: Category, date: &str) -> ExpenseRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        ExpenseRecord::new("r", amount, category, date)
    }

    #[test]
    fn test_last_months_window() {
        let today = NaiveDate::from_ymd_opt(2024, 8, 31).unwrap();
        let options = TrendOptions::last_months(today, 6);
        assert_eq!(options.since, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(options.until, Some(today));
        assert_eq!(options.exclude_category, Some(Category::Income));

        let expenses = vec![
            record(10.0, Category::Food, "2024-02-28"),
            record(20.0, Category::Food, "2024-02-29"),
            record(30.0, Category::Food, "2024-08-31"),
            record(40.0, Category::Food, "2024-09-01"),
        ];
        let report = analyze_trends(&expenses, &options);
        assert_eq!(report.total_spent, 50.0);
    }

    #[test]
    fn test_empty_input() {
        let report = analyze_trends(&[], &TrendOptions::default());
        assert!(report.points.is_empty());
        assert_eq!(report.direction, TrendDirection::Stable);
        assert_eq!(report.average_monthly, 0.0);
        assert_eq!(report.total_spent, 0.0);
        assert_eq!(report.last_month_total, 0.0);
        assert!(report.category_breakdown.is_empty());
    }

    #[test]
    fn test_change_percent_between_months() {
        let expenses = vec![
            record(600.0, Category::Food, "2024-01-03"),
            record(400.0, Category::Transport, "2024-01-20"),
            record(1200.0, Category::Food, "2024-02-11"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());

        assert_eq!(report.points.len(), 2);
        assert_eq!(report.points[0].month, "2024-01");
        assert_eq!(report.points[0].total, 1000.0);
        assert_eq!(report.points[0].count, 2);
        assert_eq!(report.points[0].average, 500.0);
        assert_eq!(report.points[0].change_percent, 0.0);
        assert_eq!(report.points[1].month, "2024-02");
        assert_eq!(report.points[1].change_percent, 20.0);
        assert_eq!(report.direction, TrendDirection::Increasing);
        assert_eq!(report.average_monthly, 1100.0);
        assert_eq!(report.last_month_total, 1200.0);
    }

    #[test]
    fn test_average_uses_unrounded_total() {
        let expenses = vec![
            record(0.004, Category::Food, "2024-01-01"),
            record(0.004, Category::Food, "2024-01-02"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.points[0].total, 0.01);
        assert_eq!(report.points[0].average, 0.0);
    }

    #[test]
    fn test_months_sorted_regardless_of_input_order() {
        let expenses = vec![
            record(50.0, Category::Food, "2024-03-01"),
            record(80.0, Category::Food, "2023-12-31"),
            record(70.0, Category::Food, "2024-01-15"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        let months: Vec<&str> = report.points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-03"]);
        assert_eq!(report.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_equal_last_two_months_is_decreasing() {
        let expenses = vec![
            record(100.0, Category::Food, "2024-01-01"),
            record(100.0, Category::Food, "2024-02-01"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_single_month_is_stable() {
        let expenses = vec![record(100.0, Category::Food, "2024-01-01")];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.direction, TrendDirection::Stable);
        assert_eq!(report.average_monthly, 100.0);
    }

    #[test]
    fn test_income_excluded_by_default() {
        let expenses = vec![
            record(100.0, Category::Food, "2024-01-01"),
            record(50000.0, Category::Income, "2024-01-05"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.points[0].total, 100.0);

        let all = TrendOptions {
            exclude_category: None,
            ..Default::default()
        };
        let report = analyze_trends(&expenses, &all);
        assert_eq!(report.points[0].total, 50100.0);
    }

    #[test]
    fn test_category_filter_and_date_bounds() {
        let expenses = vec![
            record(100.0, Category::Food, "2024-01-01"),
            record(30.0, Category::Transport, "2024-01-02"),
            record(200.0, Category::Food, "2024-02-01"),
            record(300.0, Category::Food, "2024-03-01"),
        ];
        let options = TrendOptions {
            category: Some(Category::Food),
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            until: NaiveDate::from_ymd_opt(2024, 2, 29),
            ..Default::default()
        };
        let report = analyze_trends(&expenses, &options);
        assert_eq!(report.points.len(), 2);
        assert_eq!(report.total_spent, 300.0);
        assert_eq!(report.category_breakdown.len(), 1);
        assert_eq!(report.category_breakdown[0].percentage, 100.0);
    }

    #[test]
    fn test_zero_previous_month_guards_division() {
        let expenses = vec![
            record(0.0, Category::Food, "2024-01-01"),
            record(80.0, Category::Food, "2024-02-01"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.points[1].change_percent, 0.0);
    }

    #[test]
    fn test_category_breakdown_sorted_by_total() {
        let expenses = vec![
            record(25.0, Category::Food, "2024-01-01"),
            record(75.0, Category::Housing, "2024-01-02"),
        ];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.category_breakdown[0].category, Category::Housing);
        assert_eq!(report.category_breakdown[0].percentage, 75.0);
        assert_eq!(report.category_breakdown[1].percentage, 25.0);
    }

    #[test]
    fn test_unusable_amounts_skipped() {
        let mut bad = record(0.0, Category::Food, "2024-01-01");
        bad.amount = None;
        let expenses = vec![bad, record(10.0, Category::Food, "2024-01-02")];
        let report = analyze_trends(&expenses, &TrendOptions::default());
        assert_eq!(report.points[0].count, 1);
        assert_eq!(report.points[0].total, 10.0);
    }

    #[test]
    fn test_idempotent() {
        let expenses = vec![
            record(12.345, Category::Food, "2024-01-01"),
            record(99.99, Category::Shopping, "2024-02-01"),
            record(3.5, Category::Food, "2024-02-03"),
        ];
        let a = serde_json::to_string(&analyze_trends(&expenses, &TrendOptions::default())).unwrap();
        let b = serde_json::to_string(&analyze_trends(&expenses, &TrendOptions::default())).unwrap();
        assert_eq!(a, b);
    }
}
