//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token cookie was present but could not be decoded, or has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// There was an error creating or formatting a date time for the auth cookie.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not compute the auth cookie expiry: {0}")]
    InvalidDateTime(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is empty, too long or contains characters that are not allowed.
    #[error("\"{0}\" is not a valid username")]
    InvalidUsername(String),

    /// The email address is not well formed.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The security question or its answer was left empty.
    #[error("the security question and answer must not be empty")]
    EmptySecurityQuestion,

    /// The answer to the security question did not match the stored answer.
    #[error("incorrect answer to the security question")]
    IncorrectSecurityAnswer,

    /// A user with the same username already exists.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// A user with the same email address already exists.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An entry was submitted without a description.
    #[error("the description must not be empty")]
    EmptyDescription,

    /// The amount could not be parsed as a finite number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// The amount was below zero.
    #[error("the amount {0} is negative")]
    NegativeAmount(f64),

    /// The date was not a valid calendar date in the format YYYY-MM-DD.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The entry kind was neither "income" nor "expense".
    #[error("\"{0}\" is not a valid entry kind")]
    InvalidEntryKind(String),

    /// The category is not part of the taxonomy.
    #[error("\"{0}\" is not a known category")]
    UnknownCategory(String),

    /// The subcategory does not belong to the given category.
    #[error("\"{subcategory}\" is not a subcategory of \"{category}\"")]
    UnknownSubcategory {
        /// The category the subcategory was checked against.
        category: String,
        /// The rejected subcategory.
        subcategory: String,
    },

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete an entry that does not exist or belongs to someone else.
    #[error("tried to delete an entry that is not in the database")]
    DeleteMissingEntry,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            error @ (Error::EmptyDescription
            | Error::InvalidAmount(_)
            | Error::NegativeAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidEntryKind(_)
            | Error::UnknownCategory(_)
            | Error::UnknownSubcategory { .. }) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid entry".to_owned(),
                    details: capitalise_first_char(&error.to_string()),
                },
            ),
            Error::DeleteMissingEntry => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete entry".to_owned(),
                    details: "The entry could not be found. \
                    Try refreshing the page to see if the entry has already been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rusqlite::Connection;

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    fn unique_violation(column: &str) -> rusqlite::Error {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute(
                "CREATE TABLE user (username TEXT UNIQUE, email TEXT UNIQUE)",
                (),
            )
            .unwrap();
        connection
            .execute("INSERT INTO user (username, email) VALUES ('a', 'a@b.c')", ())
            .unwrap();

        let statement = if column == "username" {
            "INSERT INTO user (username, email) VALUES ('a', 'x@y.z')"
        } else {
            "INSERT INTO user (username, email) VALUES ('b', 'a@b.c')"
        };

        connection.execute(statement, ()).unwrap_err()
    }

    #[test]
    fn maps_unique_username_violation() {
        assert_eq!(
            Error::from(unique_violation("username")),
            Error::DuplicateUsername
        );
    }

    #[test]
    fn maps_unique_email_violation() {
        assert_eq!(Error::from(unique_violation("email")), Error::DuplicateEmail);
    }

    #[test]
    fn maps_no_rows_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[tokio::test]
    async fn validation_error_renders_bad_request_alert() {
        let response = Error::InvalidAmount("abc".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("\"abc\" is not a valid amount"),
            "alert text {text:?} does not mention the invalid amount"
        );
    }

    #[tokio::test]
    async fn missing_entry_renders_not_found_alert() {
        let response = Error::DeleteMissingEntry.into_alert_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
