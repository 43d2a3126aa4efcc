//! Monthly summary and category insights

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{round2, Category, ExpenseRecord};

/// Number of largest expenses listed in a monthly summary
pub const TOP_EXPENSES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopExpense {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: Category,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    pub total_expenses: f64,
    pub total_income: f64,
    pub net_amount: f64,
    pub transaction_count: usize,
    pub by_category: Vec<CategoryTotal>,
    pub daily_totals: Vec<DailyTotal>,
    pub top_expenses: Vec<TopExpense>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInsight {
    pub category: Category,
    pub total: f64,
    pub count: usize,
    pub average: f64,
    pub percentage: f64,
}

/// Parse a `YYYY-MM` month key into (year, month)
pub fn parse_month_key(key: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", key.trim()), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("Invalid month '{}', expected YYYY-MM", key)))?;
    Ok((first.year(), first.month()))
}

/// Summarize one calendar month; records outside the month are ignored
pub fn summarize_month(expenses: &[ExpenseRecord], year: i32, month: u32) -> MonthlySummary {
    let mut total_expenses = 0.0;
    let mut total_income = 0.0;
    let mut transaction_count = 0;
    let mut by_category: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut spending: Vec<(&ExpenseRecord, f64)> = Vec::new();

    for record in expenses
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
    {
        let Some(amount) = record.usable_amount() else {
            continue;
        };
        transaction_count += 1;

        let entry = by_category.entry(record.category).or_insert((0.0, 0));
        entry.0 += amount;
        entry.1 += 1;

        if record.category.is_income() {
            total_income += amount;
        } else {
            total_expenses += amount;
            *daily.entry(record.date).or_insert(0.0) += amount;
            spending.push((record, amount));
        }
    }

    // Stable sort keeps input order among equal amounts
    spending.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top_expenses = spending
        .into_iter()
        .take(TOP_EXPENSES)
        .map(|(record, amount)| TopExpense {
            id: record.id.clone(),
            date: record.date,
            amount,
            category: record.category,
            description: record.description.clone(),
        })
        .collect();

    MonthlySummary {
        month: format!("{:04}-{:02}", year, month),
        total_expenses: round2(total_expenses),
        total_income: round2(total_income),
        net_amount: round2(total_income - total_expenses),
        transaction_count,
        by_category: by_category
            .into_iter()
            .map(|(category, (amount, count))| CategoryTotal {
                category,
                amount: round2(amount),
                count,
            })
            .collect(),
        daily_totals: daily
            .into_iter()
            .map(|(date, total)| DailyTotal {
                date,
                total: round2(total),
            })
            .collect(),
        top_expenses,
    }
}

/// Per-category spending share, largest first; INCOME is excluded
pub fn category_insights(expenses: &[ExpenseRecord]) -> Vec<CategoryInsight> {
    let mut totals: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    for record in expenses.iter().filter(|r| !r.category.is_income()) {
        if let Some(amount) = record.usable_amount() {
            let entry = totals.entry(record.category).or_insert((0.0, 0));
            entry.0 += amount;
            entry.1 += 1;
        }
    }

    let total_spent: f64 = totals.values().map(|(t, _)| t).sum();
    let mut insights: Vec<CategoryInsight> = totals
        .into_iter()
        .map(|(category, (total, count))| CategoryInsight {
            category,
            total: round2(total),
            count,
            average: round2(total / count as f64),
            percentage: if total_spent > 0.0 {
                round2(total / total_spent * 100.0)
            } else {
                0.0
            },
        })
        .collect();
    insights.sort_by(|a, b| b.total.total_cmp(&a.total));
    insights
}
