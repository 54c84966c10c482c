//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for the dashboard page
//! - The route handler for the ledger summary as JSON
//! - HTML view functions for rendering the dashboard UI

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{
        cards::summary_cards_view,
        charts::{ECHARTS_URL, build_dashboard_charts, charts_script, charts_view},
    },
    endpoints,
    entry::get_entries_by_owner,
    html::{HeadElement, base, link},
    ledger::{LedgerSummary, summarize},
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading entries.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Summarise the entries of `user_id` as of today in the configured timezone.
///
/// # Errors
/// Returns an error if the database lock is poisoned, the query fails or the
/// timezone is invalid.
fn load_summary(state: &DashboardState, user_id: UserID) -> Result<LedgerSummary, Error> {
    let today = local_today(&state.local_timezone)?;

    let entries = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_entries_by_owner(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get entries for {user_id}: {error}"))?
    };

    Ok(summarize(&entries, today))
}

/// Display a page with an overview of the user's income and expenses.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let summary = load_summary(&state, user_id)?;
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if summary.has_entries() {
        Ok(dashboard_view(nav_bar, &summary).into_response())
    } else {
        Ok(dashboard_no_data_view(nav_bar, &summary).into_response())
    }
}

/// Respond with the user's [LedgerSummary] as JSON.
pub async fn get_summary(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    match load_summary(&state, user_id) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// Renders the dashboard page when the user has no entries.
///
/// The cards still show zeros, followed by a prompt to add an entry.
fn dashboard_no_data_view(nav_bar: NavBar, summary: &LedgerSummary) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_entry_link = link(endpoints::NEW_ENTRY_VIEW, "add your first entry");

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards_view(summary))

            h2 class="text-xl font-bold" { "Nothing here yet..." }

            p
            {
                "Charts will show up here once you record some income or expenses. "
                "You can " (new_entry_link) " now."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with the summary cards and charts.
fn dashboard_view(nav_bar: NavBar, summary: &LedgerSummary) -> Markup {
    let nav_bar = nav_bar.into_html();
    let charts = build_dashboard_charts(summary);

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards_view(summary))

            (charts_view(&charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_URL.to_owned()),
        charts_script(&charts),
    ];

    base("Dashboard", &scripts, &content)
}
