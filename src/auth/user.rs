//! The user model, its validated fields and the user table queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// Keeps user IDs from being mixed up with entry IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A login name of 3 to 32 ASCII letters, digits, '_', '.' or '-'.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let username = s.trim();
        let is_valid = (3..=32).contains(&username.len())
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

        if is_valid {
            Ok(Self(username.to_owned()))
        } else {
            Err(Error::InvalidUsername(username.to_owned()))
        }
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An email address with something either side of a single '@'.
///
/// Addresses are lowercased so that the same address cannot be registered twice
/// with different capitalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl FromStr for Email {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = s.trim().to_lowercase();

        let is_valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };

        if is_valid {
            Ok(Self(email))
        } else {
            Err(Error::InvalidEmail(s.trim().to_owned()))
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The question asked before resetting a forgotten password.
    pub security_question: String,
    /// The hash of the normalized answer to `security_question`.
    pub security_answer_hash: PasswordHash,
    /// Whether the user has to pick a new password before doing anything else.
    pub must_change_password: bool,
}

/// The details needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The name the user logs in with.
    pub username: Username,
    /// The user's email address.
    pub email: Email,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The question asked before resetting a forgotten password.
    pub security_question: String,
    /// The hash of the normalized answer to `security_question`.
    pub security_answer_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                security_question TEXT NOT NULL,
                security_answer TEXT NOT NULL,
                must_change_password INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str = "id, username, email, password, security_question, security_answer, \
    must_change_password";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let password_hash: String = row.get(3)?;
    let security_answer_hash: String = row.get(5)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&password_hash),
        security_question: row.get(4)?,
        security_answer_hash: PasswordHash::new_unchecked(&security_answer_hash),
        must_change_password: row.get(6)?,
    })
}

/// Insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::DuplicateUsername] or [Error::DuplicateEmail] if another
/// user already has the same username or email, [Error::EmptySecurityQuestion]
/// if the question is blank, or [Error::SqlError] for other SQL errors.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let security_question = new_user.security_question.trim();
    if security_question.is_empty() {
        return Err(Error::EmptySecurityQuestion);
    }

    let user = connection
        .prepare(&format!(
            "INSERT INTO user (username, email, password, security_question, security_answer)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                new_user.username.as_ref(),
                new_user.email.as_ref(),
                new_user.password_hash.as_ref(),
                security_question,
                new_user.security_answer_hash.as_ref(),
            ),
            map_user_row,
        )?;

    Ok(user)
}

/// Get the user with `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user, or [Error::SqlError]
/// for other SQL errors.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)?;

    Ok(user)
}

/// Get the user called `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user, or [Error::SqlError]
/// for other SQL errors.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE username = :username"
        ))?
        .query_row(&[(":username", &username.trim())], map_user_row)?;

    Ok(user)
}

/// Replace the password of `user_id` and clear the forced password change flag.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user, or [Error::SqlError]
/// for other SQL errors.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1, must_change_password = 0 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Set whether `user_id` must change their password at their next request.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user, or [Error::SqlError]
/// for other SQL errors.
pub fn set_must_change_password(
    user_id: UserID,
    must_change_password: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET must_change_password = ?1 WHERE id = ?2",
        (must_change_password, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Get the number of registered users.
///
/// # Errors
///
/// Returns [Error::SqlError] if there is an SQL error.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod field_tests {
    use crate::{
        Error,
        auth::user::{Email, Username},
    };

    #[test]
    fn username_accepts_allowed_characters() {
        let username: Username = " jane.doe-99_ ".parse().unwrap();

        assert_eq!(username.as_ref(), "jane.doe-99_");
    }

    #[test]
    fn username_rejects_bad_length_and_characters() {
        for raw in ["ab", &"a".repeat(33), "jane doe", "jane!", ""] {
            assert_eq!(
                raw.parse::<Username>(),
                Err(Error::InvalidUsername(raw.trim().to_owned())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn email_is_lowercased() {
        let email: Email = "Jane@Example.COM".parse().unwrap();

        assert_eq!(email.as_ref(), "jane@example.com");
    }

    #[test]
    fn email_requires_local_and_domain_parts() {
        for raw in ["jane", "@example.com", "jane@", "jane@@example.com", "ja ne@x.y"] {
            assert!(raw.parse::<Email>().is_err(), "{raw:?} should be rejected");
        }
    }
}
