//! Learning context builder
//!
//! Renders the user's recent corrections into a prompt fragment so the
//! completion service can follow the user's own categorization habits.

use crate::models::LearningSample;

/// Number of corrections included in a prompt
pub const DEFAULT_LEARNING_WINDOW: usize = 10;

/// Text used when the user has no corrections yet
pub const NO_HISTORY_PLACEHOLDER: &str = "No correction history yet.";

/// Build the learning context using the default window
///
/// Samples must already be ordered most-recent-first.
pub fn build_learning_context(samples: &[LearningSample]) -> String {
    build_learning_context_with_window(samples, DEFAULT_LEARNING_WINDOW)
}

/// Build the learning context from at most `window` samples
pub fn build_learning_context_with_window(samples: &[LearningSample], window: usize) -> String {
    if samples.is_empty() || window == 0 {
        return NO_HISTORY_PLACEHOLDER.to_string();
    }

    samples
        .iter()
        .take(window)
        .map(render_sample)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_sample(sample: &LearningSample) -> String {
    let amount = sample
        .corrected_amount
        .map(|a| format!("{}", a))
        .unwrap_or_else(|| "unchanged".to_string());
    let description = sample
        .corrected_description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("unchanged");

    format!(
        "Input: \"{}\" → category: {}, amount: {}, description: {}",
        sample.original_input, sample.corrected_category, amount, description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{TimeZone, Utc};

    fn sample(input: &str, category: Category, amount: Option<f64>) -> LearningSample {
        LearningSample {
            original_input: input.to_string(),
            corrected_category: category,
            corrected_amount: amount,
            corrected_description: Some(input.split_whitespace().next().unwrap_or("").to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_history_uses_placeholder() {
        assert_eq!(build_learning_context(&[]), NO_HISTORY_PLACEHOLDER);
    }

    #[test]
    fn test_renders_one_line_per_sample() {
        let samples = vec![
            sample("Costco 2300", Category::Shopping, Some(2300.0)),
            sample("gym 800", Category::Subscription, None),
        ];
        let context = build_learning_context(&samples);
        let lines: Vec<&str> = context.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Input: \"Costco 2300\" → category: SHOPPING, amount: 2300, description: Costco"
        );
        assert!(lines[1].contains("category: SUBSCRIPTION, amount: unchanged"));
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let samples: Vec<LearningSample> = (0..15)
            .map(|i| sample(&format!("item{} {}", i, i), Category::Other, None))
            .collect();
        let context = build_learning_context(&samples);
        assert_eq!(context.lines().count(), DEFAULT_LEARNING_WINDOW);
        assert!(context.contains("item0 0"));
        assert!(context.contains("item9 9"));
        assert!(!context.contains("item10 10"));
    }

    #[test]
    fn test_custom_window() {
        let samples = vec![
            sample("a 1", Category::Food, None),
            sample("b 2", Category::Food, None),
        ];
        assert_eq!(build_learning_context_with_window(&samples, 1).lines().count(), 1);
        assert_eq!(
            build_learning_context_with_window(&samples, 0),
            NO_HISTORY_PLACEHOLDER
        );
    }
}
