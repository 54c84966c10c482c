//! Defines the endpoint for recording a new entry.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    entry::core::{EntryForm, NewEntry, create_entry},
    ledger::Taxonomy,
};

/// The state needed to create an entry.
#[derive(Debug, Clone)]
pub struct CreateEntryState {
    /// The database connection for managing entries.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The categories an entry can be recorded under.
    pub taxonomy: Arc<Taxonomy>,
}

impl FromRef<AppState> for CreateEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            taxonomy: state.taxonomy.clone(),
        }
    }
}

/// A route handler for recording a new entry, redirects to the statement on success.
///
/// Invalid form values are answered with an error alert.
pub async fn create_entry_endpoint(
    State(state): State<CreateEntryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<EntryForm>,
) -> Response {
    let new_entry = match NewEntry::from_form(&form, &state.taxonomy) {
        Ok(new_entry) => new_entry,
        Err(error) => {
            tracing::debug!("rejected entry form from user {user_id}: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_entry(new_entry, user_id, &connection) {
        tracing::error!("could not create entry: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::ENTRIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
