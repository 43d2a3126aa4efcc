//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod expenses;
pub mod health;
pub mod insights;
pub mod subscriptions;

// Re-export all handlers for use in router
pub use analytics::*;
pub use expenses::*;
pub use health::*;
pub use insights::*;
pub use subscriptions::*;

/// Reference date for windowed analyses when the request gives none
pub(crate) fn today_or(date: Option<chrono::NaiveDate>) -> chrono::NaiveDate {
    date.unwrap_or_else(|| chrono::Utc::now().date_naive())
}
