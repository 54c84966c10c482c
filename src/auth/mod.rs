//! User accounts, sessions and the pages for managing them.

mod change_password;
mod cookie;
mod forgot_password;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod security_answer;
mod token;
mod user;

pub use change_password::{get_change_password_page, post_change_password};
pub use cookie::{
    DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie,
};
pub use forgot_password::{get_forgot_password_page, post_forgot_password, post_reset_password};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{
    AuthState, PasswordChangeState, auth_guard, auth_guard_hx, password_change_guard,
};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register_user::{get_register_page, register_user};
pub use security_answer::{hash_security_answer, verify_security_answer};
pub use user::{
    Email, NewUser, User, UserID, Username, count_users, create_user, create_user_table,
    get_user_by_id, get_user_by_username, set_must_change_password, update_password,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
