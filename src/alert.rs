//! Alert messages shown to the user after htmx requests.
//!
//! Alerts are swapped into the `#alert-container` element of the base page,
//! either as the response to a failed request (via `hx-target-error`) or as
//! the body of a successful one.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A dismissable message box.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    Success {
        /// The headline of the alert.
        message: String,
        /// A longer explanation shown below the headline.
        details: String,
    },
    /// A success message without details.
    SuccessSimple {
        /// The headline of the alert.
        message: String,
    },
    /// An error message with extra details.
    Error {
        /// The headline of the alert.
        message: String,
        /// A longer explanation shown below the headline.
        details: String,
    },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, Some(details)),
            Alert::SuccessSimple { message } => (false, message, None),
            Alert::Error { message, details } => (true, message, Some(details)),
        };

        let container_style = if is_error {
            "flex items-start p-4 mb-4 text-red-800 border border-red-300 rounded-lg \
            bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "flex items-start p-4 mb-4 text-green-800 border border-green-300 rounded-lg \
            bg-green-50 dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        // Template adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div
                role="alert"
                class=(container_style)
            {
                div class="ms-3 text-sm"
                {
                    p class="font-medium" { (message) }

                    @if let Some(details) = details {
                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }
                }

                button
                    type="button"
                    class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex \
                        items-center justify-center h-8 w-8 hover:opacity-75"
                    aria-label="Close"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    span class="sr-only" { "Close" }
                    "✕"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::{
        alert::Alert,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn renders_error_with_details() {
        let response = Alert::Error {
            message: "Oh no".to_owned(),
            details: "Something broke".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let selector = Selector::parse("div[role=alert] p").unwrap();
        let paragraphs: Vec<String> = html
            .select(&selector)
            .map(|p| p.text().collect::<String>())
            .collect();
        assert_eq!(paragraphs, vec!["Oh no", "Something broke"]);
    }

    #[tokio::test]
    async fn simple_success_has_no_details() {
        let response = Alert::SuccessSimple {
            message: "Done".to_owned(),
        }
        .into_response();

        let html = parse_html_fragment(response).await;
        let selector = Selector::parse("div[role=alert] p").unwrap();
        assert_eq!(html.select(&selector).count(), 1);
    }
}
