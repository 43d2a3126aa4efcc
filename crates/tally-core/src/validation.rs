//! Checks applied before a parsed expense is confirmed

use crate::error::{Error, Result};
use crate::models::ExpenseCandidate;

/// Longest free-text input accepted for parsing
pub const MAX_INPUT_CHARS: usize = 500;

/// Reject input that cannot be parsed at all
pub fn validate_input(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Input text is required".to_string()));
    }
    if trimmed.chars().count() > MAX_INPUT_CHARS {
        return Err(Error::Validation(format!(
            "Input text must be at most {} characters",
            MAX_INPUT_CHARS
        )));
    }
    Ok(trimmed)
}

/// Reject a candidate that cannot be stored as a confirmed expense
pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::Validation("Amount must be a finite number".to_string()));
    }
    if amount <= 0.0 {
        return Err(Error::Validation("Amount must be greater than 0".to_string()));
    }
    Ok(())
}

pub fn validate_candidate(candidate: &ExpenseCandidate) -> Result<()> {
    validate_amount(candidate.amount)?;
    if candidate.confidence > 100 {
        return Err(Error::Validation(format!(
            "Confidence out of range: {}",
            candidate.confidence
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::parse_fallback;
    use crate::models::Category;

    #[test]
    fn test_validate_input() {
        assert_eq!(validate_input("  lunch 150 ").unwrap(), "lunch 150");
        assert!(matches!(validate_input(""), Err(Error::Validation(_))));
        assert!(matches!(validate_input("   \n"), Err(Error::Validation(_))));
        assert!(validate_input(&"x".repeat(MAX_INPUT_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_unparsed_fallback_needs_correction_before_confirming() {
        let candidate = parse_fallback("no amount here");
        assert_eq!(candidate.category, Category::Other);
        assert!(validate_candidate(&candidate).is_err());

        let candidate = parse_fallback("午餐 150");
        assert!(validate_candidate(&candidate).is_ok());
    }
}
