use rusqlite::Connection;

use crate::{
    auth::{NewUser, PasswordHash, User, create_user, hash_security_answer},
    db::initialize,
};

/// The password of every user made by [create_test_user].
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";
/// The security answer of every user made by [create_test_user].
pub(crate) const TEST_SECURITY_ANSWER: &str = "Rex";

pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// Insert a user called `username` with the password [TEST_PASSWORD].
///
/// A low bcrypt cost keeps the tests fast.
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    let new_user = NewUser {
        username: username.parse().expect("invalid test username"),
        email: format!("{username}@example.com")
            .parse()
            .expect("invalid test email"),
        password_hash: PasswordHash::from_raw_password(TEST_PASSWORD, 4)
            .expect("Could not hash password"),
        security_question: "What was the name of your first pet?".to_owned(),
        security_answer_hash: hash_security_answer(TEST_SECURITY_ANSWER, 4)
            .expect("Could not hash security answer"),
    };

    create_user(new_user, connection).expect("Could not create test user")
}
