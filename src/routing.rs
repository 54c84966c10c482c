//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_change_password_page, get_forgot_password_page,
        get_log_in_page, get_log_out, get_register_page, password_change_guard,
        post_change_password, post_forgot_password, post_log_in, post_reset_password,
        register_user,
    },
    dashboard::{get_dashboard_page, get_summary},
    endpoints,
    entry::{
        create_entry_endpoint, delete_entry_endpoint, get_new_entry_page, get_statement_page,
        get_subcategory_options,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
///
/// Every route except log in, registration, the forgot password flow, log out
/// and the error page needs a valid session. Users who must change their
/// password can only reach the change password routes until they do.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::FORGOT_PASSWORD_API, post(post_forgot_password))
        .route(endpoints::RESET_PASSWORD_API, post(post_reset_password))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let change_password_routes = Router::new()
        .route(
            endpoints::CHANGE_PASSWORD_VIEW,
            get(get_change_password_page),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .merge(
            Router::new()
                .route(endpoints::CHANGE_PASSWORD_API, post(post_change_password))
                .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
        );

    // Layers wrap the routes added before them, so the auth guard runs first
    // and provides the user ID to the password change guard.
    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ENTRIES_VIEW, get(get_statement_page))
        .route(endpoints::NEW_ENTRY_VIEW, get(get_new_entry_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            password_change_guard,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::ENTRIES_API, post(create_entry_endpoint))
            .route(endpoints::ENTRY, delete(delete_entry_endpoint))
            .route(endpoints::SUBCATEGORIES_API, get(get_subcategory_options))
            .route(endpoints::SUMMARY_API, get(get_summary))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                password_change_guard,
            ))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(change_password_routes)
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        AppState,
        auth::{COOKIE_TOKEN, get_user_by_username, set_must_change_password},
        endpoints::{self, format_endpoint},
        entry::get_entries_by_owner,
        ledger::Taxonomy,
        test_utils::{TEST_PASSWORD, create_test_user, get_test_connection},
    };

    use super::build_router;

    fn get_test_server(must_change_password: bool) -> (TestServer, AppState) {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        set_must_change_password(user.id, must_change_password, &connection).unwrap();

        let state = AppState::new(connection, "42", "Etc/UTC", Taxonomy::default()).unwrap();
        let server = TestServer::new(build_router(state.clone()))
            .expect("Could not create test server.");

        (server, state)
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("username", "alice"), ("password", TEST_PASSWORD)])
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_session() {
        let (server, _) = get_test_server(false);

        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::ENTRIES_VIEW,
            endpoints::NEW_ENTRY_VIEW,
            endpoints::CHANGE_PASSWORD_VIEW,
        ] {
            let response = server.get(page).await;

            assert_eq!(response.status_code(), StatusCode::SEE_OTHER, "{page}");
            let location = response.header("location");
            let location = location.to_str().unwrap();
            assert!(location.starts_with(endpoints::LOG_IN_VIEW), "{page}: {location}");
        }
    }

    #[tokio::test]
    async fn api_routes_use_hx_redirect_without_session() {
        let (server, _) = get_test_server(false);

        let response = server.get(endpoints::SUMMARY_API).await;

        assert!(response.maybe_header("hx-redirect").is_some());
    }

    #[tokio::test]
    async fn public_pages_do_not_need_a_session() {
        let (server, _) = get_test_server(false);

        for page in [
            endpoints::LOG_IN_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::FORGOT_PASSWORD_VIEW,
        ] {
            server.get(page).await.assert_status_ok();
        }
    }

    #[tokio::test]
    async fn logged_in_user_can_record_view_and_delete_entries() {
        let (server, state) = get_test_server(false);
        let cookie = log_in(&server).await;

        server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cookie.clone())
            .await
            .assert_status_ok();

        let response = server
            .post(endpoints::ENTRIES_API)
            .add_cookie(cookie.clone())
            .form(&[
                ("kind", "expense"),
                ("amount", "12.50"),
                ("date", "2025-03-01"),
                ("description", "Cinema"),
                ("category", "Lazer"),
                ("subcategory", "Cinema"),
            ])
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let entry = {
            let connection = state.db_connection.lock().unwrap();
            let user = get_user_by_username("alice", &connection).unwrap();
            let entries = get_entries_by_owner(user.id, &connection).unwrap();
            assert_eq!(entries.len(), 1);
            entries[0].clone()
        };

        let statement = server.get(endpoints::ENTRIES_VIEW).add_cookie(cookie.clone()).await;
        statement.assert_status_ok();
        assert!(statement.text().contains("Cinema"));

        server
            .delete(&format_endpoint(endpoints::ENTRY, entry.id))
            .add_cookie(cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn flagged_user_is_sent_to_change_password() {
        let (server, _) = get_test_server(true);
        let cookie = log_in(&server).await;

        let response = server.get(endpoints::DASHBOARD_VIEW).add_cookie(cookie.clone()).await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::CHANGE_PASSWORD_VIEW);

        server
            .get(endpoints::CHANGE_PASSWORD_VIEW)
            .add_cookie(cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _) = get_test_server(false);

        let response = server.get("/does/not/exist").await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }
}
