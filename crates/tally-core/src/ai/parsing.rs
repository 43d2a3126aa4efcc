//! JSON parsing helpers for completion responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the
//! outermost `{...}` is extracted first. The payload then has to pass a
//! strict schema check; any mismatch is an error, never a guess.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::Category;

const LOG_PREVIEW_CHARS: usize = 200;

/// Shorten text for error messages and logs without splitting a character
pub fn truncate_for_log(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Slice out the outermost JSON object
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate_for_log(response)
        ))),
    }
}

/// Fields extracted from a parse-expense completion
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpense {
    pub amount: f64,
    pub category: Category,
    pub description: String,
}

/// Parse and schema-check a parse-expense completion
///
/// - `amount`: required JSON number, finite and not negative
/// - `category`: required string naming one of the categories (any case)
/// - `description`: string, optional; missing or null becomes empty
pub fn parse_expense_response(response: &str) -> Result<ParsedExpense> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate_for_log(json_str)
        ))
    })?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidData("AI response is not a JSON object".into()))?;

    Ok(ParsedExpense {
        amount: required_amount(object)?,
        category: required_category(object)?,
        description: optional_description(object)?,
    })
}

fn required_amount(object: &Map<String, Value>) -> Result<f64> {
    let amount = match object.get("amount") {
        None | Some(Value::Null) => {
            return Err(Error::InvalidData("AI response missing amount".into()))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => {
            return Err(Error::InvalidData(format!(
                "AI response amount is not a number: {}",
                other
            )))
        }
    };
    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => Ok(a),
        _ => Err(Error::InvalidData(format!(
            "AI response amount out of range: {:?}",
            amount
        ))),
    }
}

fn required_category(object: &Map<String, Value>) -> Result<Category> {
    match object.get("category") {
        Some(Value::String(s)) => s
            .parse::<Category>()
            .map_err(|e| Error::InvalidData(format!("AI response category rejected: {}", e))),
        Some(other) => Err(Error::InvalidData(format!(
            "AI response category is not a string: {}",
            other
        ))),
        None => Err(Error::InvalidData("AI response missing category".into())),
    }
}

fn optional_description(object: &Map<String, Value>) -> Result<String> {
    match object.get("description") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(Error::InvalidData(format!(
            "AI response description is not a string: {}",
            other
        ))),
    }
}
