//! Resetting a forgotten password by answering the security question.
//!
//! The user first enters their username and is shown their security question.
//! Answering it correctly lets them choose a new password.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, User, get_user_by_username, password::validate_new_password,
        update_password, verify_security_answer,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input, text_input,
    },
};

/// Shown for unknown usernames and wrong answers alike.
pub const RESET_FAILED_MSG: &str = "The username or answer is incorrect.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn submit_button(label: &str) -> Markup {
    html! {
        button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
        {
            span class="inline htmx-indicator" id="indicator"
            {
                (loading_spinner())
            }
            (label)
        }
    }
}

fn username_form(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::FORGOT_PASSWORD_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", username, None))

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            (submit_button("Next"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

#[derive(Debug, Default)]
struct ResetErrors {
    new_password: Option<String>,
    confirm_password: Option<String>,
    form: Option<String>,
}

fn reset_form(username: &str, security_question: &str, errors: &ResetErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::RESET_PASSWORD_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            input type="hidden" name="username" value=(username);

            div
            {
                span class=(FORM_LABEL_STYLE) { "Security question" }
                p id="security-question" class="text-gray-900 dark:text-white" { (security_question) }
            }

            (text_input("security_answer", "Answer", "text", "", None))

            (password_input("new_password", "New password", 8, errors.new_password.as_deref()))

            (password_input(
                "confirm_password",
                "Confirm new password",
                8,
                errors.confirm_password.as_deref()
            ))

            @if let Some(message) = &errors.form {
                p class=(FORM_ERROR_STYLE) { (message) }
            }

            (submit_button("Reset password"))
        }
    }
}

/// Display the first step of the password reset, asking for the username.
pub async fn get_forgot_password_page() -> Response {
    let content = log_in_register("Forgot your password?", &username_form("", None));

    base("Forgot Password", &[], &content).into_response()
}

/// The state needed to reset a password.
#[derive(Debug, Clone)]
pub struct ForgotPasswordState {
    /// The bcrypt cost for the new password hash.
    pub hash_cost: u32,
    /// The database connection for looking up and updating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ForgotPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            hash_cost: PasswordHash::DEFAULT_COST,
            db_connection: state.db_connection.clone(),
        }
    }
}

fn find_user(state: &ForgotPasswordState, username: &str) -> Result<User, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_username(username.trim(), &connection)
}

/// The username entered on the forgot password page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordForm {
    pub username: String,
}

/// Show the security question of the named user.
pub async fn post_forgot_password(
    State(state): State<ForgotPasswordState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let username = form.username.trim();

    match find_user(&state, username) {
        Ok(user) => {
            reset_form(&user.username, &user.security_question, &ResetErrors::default())
                .into_response()
        }
        Err(Error::NotFound) => {
            tracing::debug!("password reset requested for unknown user {username:?}");
            username_form(username, Some(RESET_FAILED_MSG)).into_response()
        }
        Err(error) => {
            tracing::error!("could not look up user for password reset: {error}");
            username_form(username, Some(INTERNAL_ERROR_MSG)).into_response()
        }
    }
}

/// The answer and new password entered on the reset form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordForm {
    pub username: String,
    pub security_answer: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Set a new password if the security answer is correct.
///
/// On success the client is sent to the log in page.
pub async fn post_reset_password(
    State(state): State<ForgotPasswordState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let username = form.username.trim();

    let user = match find_user(&state, username) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return username_form(username, Some(RESET_FAILED_MSG)).into_response();
        }
        Err(error) => {
            tracing::error!("could not look up user for password reset: {error}");
            return username_form(username, Some(INTERNAL_ERROR_MSG)).into_response();
        }
    };

    let rerender = |errors: ResetErrors| {
        reset_form(&user.username, &user.security_question, &errors).into_response()
    };

    match verify_security_answer(&user.security_answer_hash, &form.security_answer) {
        Ok(()) => {}
        Err(Error::IncorrectSecurityAnswer) => {
            tracing::debug!("wrong security answer for user {}", user.id);
            return rerender(ResetErrors {
                form: Some(RESET_FAILED_MSG.to_owned()),
                ..Default::default()
            });
        }
        Err(error) => {
            tracing::error!("could not verify security answer: {error}");
            return rerender(ResetErrors {
                form: Some(INTERNAL_ERROR_MSG.to_owned()),
                ..Default::default()
            });
        }
    }

    let new_password = match validate_new_password(
        &form.new_password,
        &form.confirm_password,
        &[&user.username, &user.email],
    ) {
        Ok(new_password) => new_password,
        Err(problem) => {
            return rerender(ResetErrors {
                new_password: problem.password_message(),
                confirm_password: problem.confirm_message(),
                form: None,
            });
        }
    };

    let result = PasswordHash::new(new_password, state.hash_cost).and_then(|password_hash| {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        update_password(user.id, &password_hash, &connection)
    });

    match result {
        Ok(()) => {
            tracing::info!("user {} reset their password", user.id);
            (
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not reset password for user {}: {error}", user.id);
            rerender(ResetErrors {
                form: Some(INTERNAL_ERROR_MSG.to_owned()),
                ..Default::default()
            })
        }
    }
}
