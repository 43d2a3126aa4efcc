//! Recurring subscription tracking
//!
//! Billing-cycle arithmetic, cost summaries and the daily billing plan
//! (reminders plus auto-recorded charges). Everything here is computed from
//! caller-supplied subscriptions; storing reminders or charges is left to
//! the caller.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{round2, Category};

/// Days ahead the billing plan looks at
pub const BILLING_LOOKAHEAD_DAYS: i64 = 7;

/// Default upcoming-billing window for summaries
pub const DEFAULT_UPCOMING_DAYS: i64 = 30;

/// Reminder offsets used when a subscription does not specify any
pub const DEFAULT_REMINDER_DAYS: [i64; 3] = [3, 1, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// The billing date one cycle after `from`
    ///
    /// Month arithmetic clamps to the end of shorter months (Jan 31 + 1
    /// month is Feb 29 in a leap year). `None` only past chrono's date range.
    pub fn next_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Weekly => from.checked_add_days(Days::new(7)),
            Self::Monthly => from.checked_add_months(Months::new(1)),
            Self::Quarterly => from.checked_add_months(Months::new(3)),
            Self::Yearly => from.checked_add_months(Months::new(12)),
        }
    }

    /// Cost of one charge spread over a month
    pub fn monthly_equivalent(&self, amount: f64) -> f64 {
        match self {
            Self::Weekly => amount * 52.0 / 12.0,
            Self::Monthly => amount,
            Self::Quarterly => amount / 3.0,
            Self::Yearly => amount / 12.0,
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "QUARTERLY" => Ok(Self::Quarterly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_reminder_days() -> Vec<i64> {
    DEFAULT_REMINDER_DAYS.to_vec()
}

fn default_auto_record() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(deserialize_with = "crate::models::deserialize_record_date")]
    pub next_billing_date: NaiveDate,
    #[serde(default = "default_reminder_days")]
    pub reminder_days: Vec<i64>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default = "default_auto_record")]
    pub auto_record: bool,
}

impl Subscription {
    pub fn new(id: &str, name: &str, amount: f64, cycle: BillingCycle, next: NaiveDate) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            amount,
            billing_cycle: cycle,
            next_billing_date: next,
            reminder_days: default_reminder_days(),
            status: SubscriptionStatus::Active,
            auto_record: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Whole days from `today` to the next billing date (negative if overdue)
    pub fn days_until_billing(&self, today: NaiveDate) -> i64 {
        (self.next_billing_date - today).num_days()
    }

    pub fn monthly_equivalent(&self) -> f64 {
        self.billing_cycle.monthly_equivalent(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBilling {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub billing_date: NaiveDate,
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    /// Active plus paused; cancelled subscriptions are not counted
    pub total_subscriptions: usize,
    pub active_subscriptions: usize,
    pub paused_subscriptions: usize,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub upcoming: Vec<UpcomingBilling>,
}

/// Summarize subscription costs and list upcoming billings within `upcoming_days`
pub fn summarize_subscriptions(
    subscriptions: &[Subscription],
    today: NaiveDate,
    upcoming_days: i64,
) -> SubscriptionSummary {
    let active: Vec<&Subscription> = subscriptions.iter().filter(|s| s.is_active()).collect();
    let paused = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Paused)
        .count();

    let monthly_total: f64 = active.iter().map(|s| s.monthly_equivalent()).sum();

    let mut upcoming: Vec<UpcomingBilling> = active
        .iter()
        .filter_map(|s| {
            let days_until = s.days_until_billing(today);
            (0..=upcoming_days).contains(&days_until).then(|| UpcomingBilling {
                id: s.id.clone(),
                name: s.name.clone(),
                amount: s.amount,
                billing_date: s.next_billing_date,
                days_until,
            })
        })
        .collect();
    upcoming.sort_by_key(|u| u.billing_date);

    SubscriptionSummary {
        total_subscriptions: active.len() + paused,
        active_subscriptions: active.len(),
        paused_subscriptions: paused,
        monthly_total: round2(monthly_total),
        yearly_total: round2(monthly_total * 12.0),
        upcoming,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingReminder {
    pub subscription_id: String,
    pub days_until: i64,
    pub title: String,
    pub message: String,
}

/// An expense to record for a subscription charged today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCharge {
    pub subscription_id: String,
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAdvance {
    pub subscription_id: String,
    pub next_billing_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPlan {
    pub subscriptions_checked: usize,
    pub reminders: Vec<BillingReminder>,
    pub charges: Vec<AutoCharge>,
    pub advances: Vec<BillingAdvance>,
}

fn reminder_for(sub: &Subscription, days_until: i64) -> BillingReminder {
    let (title, message) = match days_until {
        0 => (
            "Subscription charge today",
            format!("Your {} subscription will be charged ${} today", sub.name, sub.amount),
        ),
        1 => (
            "Subscription charge reminder",
            format!("Your {} subscription will be charged ${} tomorrow", sub.name, sub.amount),
        ),
        n => (
            "Subscription charge reminder",
            format!(
                "Your {} subscription will be charged ${} in {} days",
                sub.name, sub.amount, n
            ),
        ),
    };
    BillingReminder {
        subscription_id: sub.id.clone(),
        days_until,
        title: title.to_string(),
        message,
    }
}

/// Plan today's billing run for active subscriptions due within a week
pub fn plan_billing(subscriptions: &[Subscription], today: NaiveDate) -> BillingPlan {
    let mut plan = BillingPlan::default();

    for sub in subscriptions.iter().filter(|s| s.is_active()) {
        let days_until = sub.days_until_billing(today);
        if !(0..=BILLING_LOOKAHEAD_DAYS).contains(&days_until) {
            continue;
        }
        plan.subscriptions_checked += 1;

        if sub.reminder_days.contains(&days_until) {
            plan.reminders.push(reminder_for(sub, days_until));
        }

        if days_until != 0 {
            continue;
        }

        if sub.auto_record {
            plan.charges.push(AutoCharge {
                subscription_id: sub.id.clone(),
                amount: sub.amount,
                category: Category::Subscription,
                description: format!("{} - subscription charge", sub.name),
                date: today,
            });
        }

        match sub.billing_cycle.next_date(sub.next_billing_date) {
            Some(next) => plan.advances.push(BillingAdvance {
                subscription_id: sub.id.clone(),
                next_billing_date: next,
            }),
            None => tracing::warn!(id = %sub.id, "Next billing date out of range"),
        }
    }

    tracing::debug!(
        checked = plan.subscriptions_checked,
        reminders = plan.reminders.len(),
        charges = plan.charges.len(),
        "Billing plan ready"
    );
    plan
}
