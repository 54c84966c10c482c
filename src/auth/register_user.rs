//! The registration page and the endpoint that creates users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Email, NewUser, PasswordHash, User, Username, ValidatedPassword, create_user,
        hash_security_answer, invalidate_auth_cookie, password::validate_new_password,
        set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, LINK_STYLE, base, loading_spinner,
        log_in_register, password_input, text_input,
    },
    timezone::get_local_offset,
};

const PASSWORD_MIN_LENGTH: u8 = 8;

/// The messages shown beneath each field of the registration form.
#[derive(Debug, Default, PartialEq)]
struct RegistrationErrors {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
    security_question: Option<String>,
    security_answer: Option<String>,
    form: Option<String>,
}

impl RegistrationErrors {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn registration_form(form: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", &form.username, errors.username.as_deref()))

            (text_input("email", "Email", "email", &form.email, errors.email.as_deref()))

            (password_input("password", "Password", PASSWORD_MIN_LENGTH, errors.password.as_deref()))

            (password_input(
                "confirm_password",
                "Confirm password",
                PASSWORD_MIN_LENGTH,
                errors.confirm_password.as_deref()
            ))

            (text_input(
                "security_question",
                "Security question",
                "text",
                &form.security_question,
                errors.security_question.as_deref()
            ))

            (text_input(
                "security_answer",
                "Answer to the security question",
                "text",
                "",
                errors.security_answer.as_deref()
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
                "Create account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                    "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form(&RegisterForm::default(), &RegistrationErrors::default());
    let content = log_in_register("Create an account", &form);

    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The bcrypt cost for the password and security answer hashes.
    pub hash_cost: u32,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            hash_cost: PasswordHash::DEFAULT_COST,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub security_question: String,
    pub security_answer: String,
}

/// The form after every field has passed validation.
struct ValidRegistration {
    username: Username,
    email: Email,
    password: ValidatedPassword,
    security_question: String,
}

fn validate_form(form: &RegisterForm) -> Result<ValidRegistration, RegistrationErrors> {
    let mut errors = RegistrationErrors::default();

    let username = form
        .username
        .parse::<Username>()
        .inspect_err(|_| {
            errors.username = Some(
                "Usernames must be 3 to 32 letters, digits, '_', '.' or '-'.".to_owned(),
            )
        })
        .ok();

    let email = form
        .email
        .parse::<Email>()
        .inspect_err(|_| errors.email = Some("Enter a valid email address.".to_owned()))
        .ok();

    let password = validate_new_password(
        &form.password,
        &form.confirm_password,
        &[form.username.trim(), form.email.trim()],
    )
    .inspect_err(|problem| {
        errors.password = problem.password_message();
        errors.confirm_password = problem.confirm_message();
    })
    .ok();

    let security_question = form.security_question.trim();
    if security_question.is_empty() {
        errors.security_question = Some("Enter a security question.".to_owned());
    }

    if form.security_answer.trim().is_empty() {
        errors.security_answer = Some("Enter an answer to your security question.".to_owned());
    }

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => {
            Ok(ValidRegistration {
                username,
                email,
                password,
                security_question: security_question.to_owned(),
            })
        }
        _ => Err(errors),
    }
}

fn store_user(
    state: &RegistrationState,
    registration: ValidRegistration,
    security_answer: &str,
) -> Result<User, Error> {
    let password_hash = PasswordHash::new(registration.password, state.hash_cost)?;
    let security_answer_hash = hash_security_answer(security_answer, state.hash_cost)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(
        NewUser {
            username: registration.username,
            email: registration.email,
            password_hash,
            security_question: registration.security_question,
            security_answer_hash,
        },
        &connection,
    )
}

/// Create a user from the registration form and log them in.
///
/// Invalid fields and taken usernames or email addresses are reported inline
/// by returning the form with error messages.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = match validate_form(&form) {
        Ok(registration) => registration,
        Err(errors) => return registration_form(&form, &errors).into_response(),
    };

    let user = match store_user(&state, registration, &form.security_answer) {
        Ok(user) => user,
        Err(Error::DuplicateUsername) => {
            let errors = RegistrationErrors {
                username: Some("That username is already taken.".to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(Error::DuplicateEmail) => {
            let errors = RegistrationErrors {
                email: Some("That email address is already registered.".to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("could not create user: {error}");
            let errors = RegistrationErrors {
                form: Some("An internal error occurred. Please try again later.".to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
    };

    tracing::info!("registered user {} ({})", user.username, user.id);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    match set_auth_cookie(jar.clone(), user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}
