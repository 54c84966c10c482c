//! The page and endpoint for a logged in user to change their password.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
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
        PasswordHash, UserID, get_user_by_id, password::validate_new_password, update_password,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, LINK_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
};

const WRONG_PASSWORD_MSG: &str = "Your current password is incorrect.";

#[derive(Debug, Default)]
struct ChangePasswordErrors {
    current_password: Option<String>,
    new_password: Option<String>,
    confirm_password: Option<String>,
    form: Option<String>,
}

fn change_password_form(errors: &ChangePasswordErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::CHANGE_PASSWORD_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (password_input(
                "current_password",
                "Current password",
                0,
                errors.current_password.as_deref()
            ))

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

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Change password"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                a href=(endpoints::LOG_OUT) tabindex="0" class=(LINK_STYLE) { "Log out" }
            }
        }
    }
}

/// Display the change password page.
pub async fn get_change_password_page() -> Response {
    let form = change_password_form(&ChangePasswordErrors::default());
    let content = log_in_register("Change your password", &form);

    base("Change Password", &[], &content).into_response()
}

/// The state needed to change a password.
#[derive(Debug, Clone)]
pub struct ChangePasswordState {
    /// The bcrypt cost for the new password hash.
    pub hash_cost: u32,
    /// The database connection for looking up and updating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChangePasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            hash_cost: PasswordHash::DEFAULT_COST,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered in the change password form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

fn change_password(
    state: &ChangePasswordState,
    user_id: UserID,
    form: &ChangePasswordForm,
) -> Result<Result<(), ChangePasswordErrors>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;

    let is_current_password = user
        .password_hash
        .verify(&form.current_password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_current_password {
        return Ok(Err(ChangePasswordErrors {
            current_password: Some(WRONG_PASSWORD_MSG.to_owned()),
            ..Default::default()
        }));
    }

    let new_password = match validate_new_password(
        &form.new_password,
        &form.confirm_password,
        &[&user.username, &user.email],
    ) {
        Ok(new_password) => new_password,
        Err(problem) => {
            return Ok(Err(ChangePasswordErrors {
                new_password: problem.password_message(),
                confirm_password: problem.confirm_message(),
                ..Default::default()
            }));
        }
    };

    let password_hash = PasswordHash::new(new_password, state.hash_cost)?;
    update_password(user_id, &password_hash, &connection)?;

    Ok(Ok(()))
}

/// Replace the logged in user's password and clear any forced password change.
pub async fn post_change_password(
    State(state): State<ChangePasswordState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    match change_password(&state, user_id, &form) {
        Ok(Ok(())) => {
            tracing::info!("user {user_id} changed their password");
            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Ok(Err(errors)) => change_password_form(&errors).into_response(),
        Err(error) => {
            tracing::error!("could not change password for user {user_id}: {error}");
            change_password_form(&ChangePasswordErrors {
                form: Some("An internal error occurred. Please try again later.".to_owned()),
                ..Default::default()
            })
            .into_response()
        }
    }
}
