//! The statement: a table of the current user's entries, newest first.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    entry::core::{Entry, EntryKind, get_entries_by_owner},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, delete_row_button, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for [get_statement_page].
#[derive(Debug, Clone)]
pub struct StatementState {
    /// The database connection for reading entries.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

const INCOME_AMOUNT_STYLE: &str = "px-6 py-4 text-right text-green-600 dark:text-green-400";
const EXPENSE_AMOUNT_STYLE: &str = "px-6 py-4 text-right text-red-600 dark:text-red-400";

fn entry_row(entry: &Entry) -> Markup {
    let (amount_style, signed_amount) = match entry.kind {
        EntryKind::Income => (INCOME_AMOUNT_STYLE, entry.amount),
        EntryKind::Expense => (EXPENSE_AMOUNT_STYLE, -entry.amount),
    };
    let delete_url = format_endpoint(endpoints::ENTRY, entry.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? This cannot be undone.",
        entry.description
    );

    html!(
        tr class=(TABLE_ROW_STYLE) data-entry-id=(entry.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(entry.date) { (entry.date) }
            }
            th
                scope="row"
                class="px-6 py-4 font-medium text-gray-900 dark:text-white"
            {
                (entry.description)
            }
            td class=(TABLE_CELL_STYLE) { (entry.category) }
            td class=(TABLE_CELL_STYLE) { (entry.subcategory) }
            td class=(amount_style) { (format_currency(signed_amount)) }
            td class=(TABLE_CELL_STYLE)
            {
                (delete_row_button(&delete_url, &confirm_message))
            }
        }
    )
}

fn statement_view(entries: &[Entry]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ENTRIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Statement" }

                    a href=(endpoints::NEW_ENTRY_VIEW) class=(LINK_STYLE) { "Add Entry" }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Subcategory" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for entry in entries {
                                (entry_row(entry))
                            }

                            @if entries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No entries yet. Record your first one "
                                        a href=(endpoints::NEW_ENTRY_VIEW) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Statement", &[], &content)
}

/// Render the statement of the logged in user's entries.
pub async fn get_statement_page(
    State(state): State<StatementState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let entries = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_entries_by_owner(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get entries for {user_id}: {error}"))?
    };

    Ok(statement_view(&entries).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::UserID,
        endpoints::{self, format_endpoint},
        entry::core::{EntryKind, NewEntry, create_entry},
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, page_text,
            parse_html_document,
        },
    };

    use super::{StatementState, get_statement_page};

    fn new_entry(description: &str, kind: EntryKind, amount: f64, date: time::Date) -> NewEntry {
        NewEntry {
            description: description.to_owned(),
            category: "Habitação".to_owned(),
            subcategory: "Aluguel".to_owned(),
            amount,
            kind,
            date,
        }
    }

    fn row_descriptions(html: &Html) -> Vec<String> {
        let selector = Selector::parse("tbody tr th").unwrap();
        html.select(&selector)
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    async fn render(connection: Connection, user_id: UserID) -> Html {
        let state = StatementState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_statement_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        parse_html_document(response).await
    }

    #[tokio::test]
    async fn lists_own_entries_newest_first() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        create_entry(
            new_entry("Rent", EntryKind::Expense, 1200.0, date!(2025 - 01 - 03)),
            alice.id,
            &connection,
        )
        .unwrap();
        create_entry(
            new_entry("Salary", EntryKind::Income, 5000.0, date!(2025 - 02 - 01)),
            alice.id,
            &connection,
        )
        .unwrap();
        create_entry(
            new_entry("Bob's rent", EntryKind::Expense, 900.0, date!(2025 - 02 - 02)),
            bob.id,
            &connection,
        )
        .unwrap();
        connection
            .execute(
                "INSERT INTO entry (description, category, subcategory, amount, kind, date)
                 VALUES ('Legacy', 'Habitação', 'Aluguel', 10.0, 'expense', '2025-02-03')",
                [],
            )
            .unwrap();

        let html = render(connection, alice.id).await;

        assert_valid_html(&html);
        assert_eq!(row_descriptions(&html), ["Salary", "Rent"]);
    }

    #[tokio::test]
    async fn rows_have_delete_buttons() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let entry = create_entry(
            new_entry("Rent", EntryKind::Expense, 1200.0, date!(2025 - 01 - 03)),
            alice.id,
            &connection,
        )
        .unwrap();

        let html = render(connection, alice.id).await;

        let selector = Selector::parse("tbody tr button[hx-delete]").unwrap();
        let button = html.select(&selector).next().expect("no delete button");
        assert_eq!(
            button.value().attr("hx-delete"),
            Some(format_endpoint(endpoints::ENTRY, entry.id).as_str())
        );
        assert!(page_text(&html).contains("-$1,200.00"));
    }

    #[tokio::test]
    async fn empty_statement_links_to_new_entry_page() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);

        let html = render(connection, alice.id).await;

        assert!(row_descriptions(&html).is_empty());
        let selector = Selector::parse("td[colspan] a").unwrap();
        let link = html.select(&selector).next().expect("no empty state link");
        assert_eq!(link.value().attr("href"), Some(endpoints::NEW_ENTRY_VIEW));
    }
}
