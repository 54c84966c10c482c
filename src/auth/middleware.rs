//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        UserID,
        cookie::{
            extend_auth_cookie_duration_if_needed, get_token_from_cookies, invalidate_auth_cookie,
        },
        get_user_by_id,
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// Sessions are kept alive for at least this long after each request.
const SESSION_EXTENSION: Duration = Duration::minutes(5);

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        tracing::warn!("No usable redirect URL for {}, falling back to dashboard.", request.uri());

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    });
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Error getting local timezone. Redirecting to log in page.");
        return get_redirect(&log_in_redirect_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    // A handler that logged the user out must not have its cookie overwritten.
    if response.headers().contains_key(SET_COOKIE) {
        return response;
    }

    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        SESSION_EXTENSION,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error:?}. Rolling back cookie jar.");
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    for (key, value) in jar.into_response().headers().iter() {
        if key == SET_COOKIE {
            parts.headers.append(key, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks for a valid authorization cookie.
///
/// The user ID is placed into the request extensions if the cookie is valid,
/// otherwise the client is redirected to the log-in page.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Same as [auth_guard], but redirects htmx requests with the HX-Redirect header.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

/// The state needed for [password_change_guard].
#[derive(Clone)]
pub struct PasswordChangeState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key for the auth cookie, needed to log out deleted users.
    pub cookie_key: Key,
}

impl FromRef<AppState> for PasswordChangeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
        }
    }
}

impl FromRef<PasswordChangeState> for Key {
    fn from_ref(state: &PasswordChangeState) -> Self {
        state.cookie_key.clone()
    }
}

enum PasswordCheck {
    Allowed,
    MustChange,
    UnknownUser,
}

fn check_password_change(state: &PasswordChangeState, user_id: UserID) -> Result<PasswordCheck, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(user) if user.must_change_password => Ok(PasswordCheck::MustChange),
        Ok(_) => Ok(PasswordCheck::Allowed),
        Err(Error::NotFound) => Ok(PasswordCheck::UnknownUser),
        Err(error) => Err(error),
    }
}

/// Middleware that sends users who must change their password to the change password page.
///
/// Must run after [auth_guard] or [auth_guard_hx], which provide the user ID.
/// Sessions of users that no longer exist are ended.
pub async fn password_change_guard(
    State(state): State<PasswordChangeState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    request: Request,
    next: Next,
) -> Response {
    let is_api_request = request.uri().path().starts_with("/api");
    let redirect = |url: &str| {
        if is_api_request {
            (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
        } else {
            Redirect::to(url).into_response()
        }
    };

    match check_password_change(&state, user_id) {
        Ok(PasswordCheck::Allowed) => next.run(request).await,
        Ok(PasswordCheck::MustChange) => {
            tracing::debug!("user {user_id} must change their password");
            redirect(endpoints::CHANGE_PASSWORD_VIEW)
        }
        Ok(PasswordCheck::UnknownUser) => {
            tracing::warn!("session for unknown user {user_id}, logging out");
            (invalidate_auth_cookie(jar), redirect(endpoints::LOG_IN_VIEW)).into_response()
        }
        Err(error) if is_api_request => error.into_alert_response(),
        Err(error) => error.into_response(),
    }
}
