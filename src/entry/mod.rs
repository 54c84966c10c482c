//! Income and expense entries.
//!
//! This module contains everything related to entries:
//! - The `Entry` model and the validated `NewEntry` built from the HTML form
//! - Database functions for storing, listing and deleting a user's entries
//! - View handlers for the statement and the new entry form

mod core;
mod create_endpoint;
mod delete_endpoint;
mod new_entry_page;
mod statement_page;

pub use core::{
    Entry, EntryForm, EntryKind, NewEntry, count_entries, create_entry, create_entry_table,
    delete_entry, get_entries_by_owner, get_entry,
};
pub use create_endpoint::create_entry_endpoint;
pub use delete_endpoint::delete_entry_endpoint;
pub use new_entry_page::{get_new_entry_page, get_subcategory_options};
pub use statement_page::get_statement_page;
