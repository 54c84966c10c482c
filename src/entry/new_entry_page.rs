//! The page for recording a new entry and the endpoint that fills in its subcategory options.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    ledger::Taxonomy,
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the new entry page and the subcategory options.
#[derive(Debug, Clone)]
pub struct NewEntryPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The categories an entry can be recorded under.
    pub taxonomy: Arc<Taxonomy>,
}

impl FromRef<AppState> for NewEntryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            taxonomy: state.taxonomy.clone(),
        }
    }
}

fn subcategory_options(subcategories: &[String]) -> Markup {
    html! {
        @for subcategory in subcategories {
            option value=(subcategory) { (subcategory) }
        }
    }
}

fn kind_radio(value: &str, label: &str, checked: bool) -> Markup {
    let id = format!("entry-kind-{value}");

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="kind"
                id=(id)
                type="radio"
                value=(value)
                checked[checked]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (label) }
        }
    }
}

fn new_entry_view(today: Date, taxonomy: &Taxonomy) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ENTRY_VIEW).into_html();
    let first_category = taxonomy.categories().next().unwrap_or_default();
    let first_subcategories = taxonomy.subcategories(first_category).unwrap_or_default();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::ENTRIES_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Entry" }

                fieldset class="space-y-2"
                {
                    legend class=(FORM_LABEL_STYLE) { "Type" }

                    div class=(FORM_RADIO_GROUP_STYLE)
                    {
                        (kind_radio("expense", "Expense", true))
                        (kind_radio("income", "Income", false))
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0"
                            placeholder="0.00"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        name="date"
                        id="date"
                        type="date"
                        required
                        value=(today)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        name="description"
                        id="description"
                        type="text"
                        placeholder="Description"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                    select
                        name="category"
                        id="category"
                        required
                        hx-get=(endpoints::SUBCATEGORIES_API)
                        hx-trigger="change"
                        hx-target="#subcategory"
                        hx-target-error="#alert-container"
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for category in taxonomy.categories() {
                            option value=(category) selected[category == first_category] { (category) }
                        }
                    }
                }

                div
                {
                    label for="subcategory" class=(FORM_LABEL_STYLE) { "Subcategory" }

                    select
                        name="subcategory"
                        id="subcategory"
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        (subcategory_options(first_subcategories))
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator"
                    {
                        (loading_spinner())
                    }
                    " Save Entry"
                }
            }
        }
    };

    base("New Entry", &[dollar_input_styles()], &content)
}

/// Renders the page for recording a new entry.
pub async fn get_new_entry_page(State(state): State<NewEntryPageState>) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    Ok(new_entry_view(today, &state.taxonomy).into_response())
}

/// The query for [get_subcategory_options].
#[derive(Debug, Deserialize)]
pub struct SubcategoryQuery {
    /// The category selected in the new entry form.
    pub category: String,
}

/// Responds with the `<option>` elements for the subcategories of the requested category.
pub async fn get_subcategory_options(
    State(state): State<NewEntryPageState>,
    Query(query): Query<SubcategoryQuery>,
) -> Response {
    match state.taxonomy.subcategories(&query.category) {
        Some(subcategories) => subcategory_options(subcategories).into_response(),
        None => {
            tracing::warn!("Requested subcategories of unknown category {}", query.category);
            Error::UnknownCategory(query.category).into_alert_response()
        }
    }
}
