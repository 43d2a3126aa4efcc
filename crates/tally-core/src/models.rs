//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Spending category
///
/// The string literals are part of the wire contract and must not change.
/// Declaration order is significant: keyword guessing and baseline reports
/// iterate categories in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Housing,
    Medical,
    Education,
    Subscription,
    Other,
    Income,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Transport => "TRANSPORT",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Shopping => "SHOPPING",
            Self::Housing => "HOUSING",
            Self::Medical => "MEDICAL",
            Self::Education => "EDUCATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Other => "OTHER",
            Self::Income => "INCOME",
        }
    }

    /// Human-readable label used in prompts and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food & drink",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Housing => "Housing & utilities",
            Self::Medical => "Medical",
            Self::Education => "Education",
            Self::Subscription => "Subscriptions",
            Self::Other => "Other",
            Self::Income => "Income",
        }
    }

    /// All categories in declaration order
    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transport,
            Self::Entertainment,
            Self::Shopping,
            Self::Housing,
            Self::Medical,
            Self::Education,
            Self::Subscription,
            Self::Other,
            Self::Income,
        ]
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
                format!("Unknown category: {} (expected one of {})", s, valid.join(", "))
            })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured expense synthesized from free text
///
/// `confidence` is an additive heuristic in 0..=100, useful for ranking and
/// for deciding whether to ask the user to confirm. It is not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCandidate {
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub confidence: u8,
    pub fallback_used: bool,
}

/// A past user correction, supplied by the caller most-recent-first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSample {
    pub original_input: String,
    pub corrected_category: Category,
    #[serde(default)]
    pub corrected_amount: Option<f64>,
    #[serde(default)]
    pub corrected_description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A historical expense record as fetched by the persistence layer
///
/// `amount` is `None` when the stored value could not be read as a finite
/// number; such records are skipped by every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_amount")]
    pub amount: Option<f64>,
    pub category: Category,
    #[serde(deserialize_with = "deserialize_record_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExpenseRecord {
    pub fn new(id: &str, amount: f64, category: Category, date: NaiveDate) -> Self {
        Self {
            id: id.to_string(),
            amount: Some(amount),
            category,
            date,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// The amount if it is usable in arithmetic
    pub fn usable_amount(&self) -> Option<f64> {
        self.amount.filter(|a| a.is_finite())
    }
}

/// Round to 2 decimal places, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accept numbers and numeric strings (NUMERIC columns often arrive as text).
/// Anything else becomes `None` instead of failing the whole payload.
pub(crate) fn deserialize_lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawAmount::deserialize(deserializer)?;
    let value = match raw {
        RawAmount::Number(n) => Some(n),
        RawAmount::Text(s) => s.trim().parse::<f64>().ok(),
        RawAmount::Other(_) => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// Accept `YYYY-MM-DD` or any timestamp that starts with it (RFC 3339 etc.).
/// Dates are assumed to be normalized to the reporting timezone upstream.
pub(crate) fn deserialize_record_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_record_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("Invalid date: {}", raw)))
}

pub(crate) fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_uses_wire_literals() {
        let json = serde_json::to_string(&Category::Subscription).unwrap();
        assert_eq!(json, r#""SUBSCRIPTION""#);

        let parsed: Category = serde_json::from_str(r#""INCOME""#).unwrap();
        assert_eq!(parsed, Category::Income);

        assert!(serde_json::from_str::<Category>(r#""Groceries""#).is_err());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("FOOD".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" transport ".parse::<Category>().unwrap(), Category::Transport);
        let err = "GROCERIES".parse::<Category>().unwrap_err();
        assert!(err.contains("SUBSCRIPTION"));
    }

    #[test]
    fn test_category_all_is_declaration_order() {
        let all = Category::all();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0], Category::Food);
        assert_eq!(all[9], Category::Income);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_candidate_serializes_camel_case() {
        let candidate = ExpenseCandidate {
            amount: 150.0,
            category: Category::Food,
            description: "lunch".to_string(),
            confidence: 50,
            fallback_used: true,
        };
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["fallbackUsed"], true);
        assert_eq!(json["category"], "FOOD");
    }

    #[test]
    fn test_record_lenient_amount() {
        let json = r#"[
            {"id": "a", "amount": 12.5, "category": "FOOD", "date": "2024-01-15"},
            {"id": "b", "amount": "99.90", "category": "FOOD", "date": "2024-01-15T08:30:00Z"},
            {"id": "c", "amount": "abc", "category": "FOOD", "date": "2024-01-16"},
            {"id": "d", "amount": null, "category": "FOOD", "date": "2024-01-16"},
            {"id": "e", "category": "FOOD", "date": "2024-01-16"}
        ]"#;
        let records: Vec<ExpenseRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].amount, Some(12.5));
        assert_eq!(records[1].amount, Some(99.9));
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(records[2].amount, None);
        assert_eq!(records[3].amount, None);
        assert_eq!(records[4].amount, None);
    }

    #[test]
    fn test_record_rejects_bad_date() {
        let json = r#"{"id": "a", "amount": 1, "category": "FOOD", "date": "15/01/2024"}"#;
        assert!(serde_json::from_str::<ExpenseRecord>(json).is_err());
    }

    #[test]
    fn test_usable_amount_filters_non_finite() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut record = ExpenseRecord::new("x", 10.0, Category::Food, date);
        assert_eq!(record.usable_amount(), Some(10.0));
        record.amount = Some(f64::NAN);
        assert_eq!(record.usable_amount(), None);
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(2.4749), 2.47);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(35.0), 35.0);
    }
}
