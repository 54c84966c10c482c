//! Summaries of a user's entries and the category taxonomy they are recorded under.

mod aggregator;
mod taxonomy;

pub use aggregator::{LedgerSummary, MonthKey, summarize};
pub use taxonomy::Taxonomy;
