//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/entries/{entry_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing a user's entries.
pub const ENTRIES_VIEW: &str = "/entries";
/// The page for recording a new entry.
pub const NEW_ENTRY_VIEW: &str = "/entries/new";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page for changing the current user's password.
pub const CHANGE_PASSWORD_VIEW: &str = "/change_password";
/// The page for resetting a forgotten password with the security question.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create users.
pub const USERS: &str = "/api/users";
/// The route to change the current user's password.
pub const CHANGE_PASSWORD_API: &str = "/api/change_password";
/// The route that looks up a user's security question.
pub const FORGOT_PASSWORD_API: &str = "/api/forgot_password";
/// The route that sets a new password after answering the security question.
pub const RESET_PASSWORD_API: &str = "/api/reset_password";
/// The route to create entries.
pub const ENTRIES_API: &str = "/api/entries";
/// The route to access a single entry.
pub const ENTRY: &str = "/api/entries/{entry_id}";
/// The route that lists the subcategories of a category as select options.
pub const SUBCATEGORIES_API: &str = "/api/subcategories";
/// The route for the ledger summary as JSON.
pub const SUMMARY_API: &str = "/api/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::ENTRIES_VIEW,
            endpoints::NEW_ENTRY_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::CHANGE_PASSWORD_VIEW,
            endpoints::FORGOT_PASSWORD_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::CHANGE_PASSWORD_API,
            endpoints::FORGOT_PASSWORD_API,
            endpoints::RESET_PASSWORD_API,
            endpoints::ENTRIES_API,
            endpoints::ENTRY,
            endpoints::SUBCATEGORIES_API,
            endpoints::SUMMARY_API,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/hello/world", 1), "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::ENTRY, 42);

        assert_eq!(formatted_path, "/api/entries/42");

        assert_eq!(format_endpoint("/hello/{world}/bye", 1), "/hello/1/bye");
    }
}
