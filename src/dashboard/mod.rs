//! Dashboard module
//!
//! Provides an overview page with the month's figures, the overall balance
//! and charts of a user's entries, plus the same summary as JSON.

mod cards;
mod charts;
mod handlers;

pub use handlers::{get_dashboard_page, get_summary};
