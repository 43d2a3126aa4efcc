//! Monthly summary and category share commands

use std::path::Path;

use anyhow::Result;
use tally_core::summary::{category_insights, parse_month_key, summarize_month};
use tally_core::ExpenseRecord;

use super::{print_json, read_json_file, truncate};

pub fn cmd_summary(file: &Path, month: &str, json: bool) -> Result<()> {
    let (year, month) = parse_month_key(month)?;
    let expenses: Vec<ExpenseRecord> = read_json_file(file)?;
    let summary = summarize_month(&expenses, year, month);

    if json {
        return print_json(&summary);
    }

    println!("📅 {}\n", summary.month);
    println!("   Expenses:     {:>12.2}", summary.total_expenses);
    println!("   Income:       {:>12.2}", summary.total_income);
    println!("   Net:          {:>12.2}", summary.net_amount);
    println!("   Transactions: {:>12}", summary.transaction_count);

    if !summary.by_category.is_empty() {
        println!("\n   By category:");
        for total in &summary.by_category {
            println!(
                "   {:<14} {:>12.2} ({})",
                total.category.as_str(),
                total.amount,
                total.count
            );
        }
    }

    if !summary.top_expenses.is_empty() {
        println!("\n   Top expenses:");
        for expense in &summary.top_expenses {
            println!(
                "   {} {:>10.2} {:<14} {}",
                expense.date,
                expense.amount,
                expense.category.as_str(),
                truncate(expense.description.as_deref().unwrap_or(""), 30)
            );
        }
    }

    Ok(())
}

pub fn cmd_categories(file: &Path, json: bool) -> Result<()> {
    let expenses: Vec<ExpenseRecord> = read_json_file(file)?;
    let insights = category_insights(&expenses);

    if json {
        return print_json(&insights);
    }

    if insights.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!("   {:<14} {:>12} {:>6} {:>10} {:>7}", "Category", "Total", "Count", "Average", "Share");
    for insight in &insights {
        println!(
            "   {:<14} {:>12.2} {:>6} {:>10.2} {:>6.1}%",
            insight.category.as_str(),
            insight.total,
            insight.count,
            insight.average,
            insight.percentage
        );
    }

    Ok(())
}
