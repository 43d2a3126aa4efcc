//! Subscription commands

use std::path::Path;

use anyhow::Result;
use tally_core::{plan_billing, summarize_subscriptions, Subscription, TallyConfig};

use super::{parse_today, print_json, read_json_file};

pub fn cmd_subscriptions(
    config: &TallyConfig,
    file: &Path,
    today: Option<&str>,
    billing: bool,
    json: bool,
) -> Result<()> {
    let subscriptions: Vec<Subscription> = read_json_file(file)?;
    let today = parse_today(today)?;

    if billing {
        let plan = plan_billing(&subscriptions, today);
        if json {
            return print_json(&plan);
        }

        println!(
            "🔔 Billing check for {} ({} active subscriptions due within a week)\n",
            today, plan.subscriptions_checked
        );
        for reminder in &plan.reminders {
            println!("   {}: {}", reminder.title, reminder.message);
        }
        for charge in &plan.charges {
            println!("   💳 {} {:.2} on {}", charge.description, charge.amount, charge.date);
        }
        for advance in &plan.advances {
            println!(
                "   ⏭️  {} next billing {}",
                advance.subscription_id, advance.next_billing_date
            );
        }
        if plan.reminders.is_empty() && plan.charges.is_empty() {
            println!("   Nothing due.");
        }
        return Ok(());
    }

    let summary = summarize_subscriptions(&subscriptions, today, config.upcoming_days);
    if json {
        return print_json(&summary);
    }

    println!(
        "📦 {} subscriptions ({} active, {} paused)\n",
        summary.total_subscriptions, summary.active_subscriptions, summary.paused_subscriptions
    );
    println!("   Monthly: {:>10.2}", summary.monthly_total);
    println!("   Yearly:  {:>10.2}", summary.yearly_total);

    if !summary.upcoming.is_empty() {
        println!("\n   Upcoming (next {} days):", config.upcoming_days);
        for billing in &summary.upcoming {
            println!(
                "   {} {:<24} {:>10.2} (in {} days)",
                billing.billing_date, billing.name, billing.amount, billing.days_until
            );
        }
    }

    Ok(())
}
