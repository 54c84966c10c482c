//! Password strength validation and bcrypt hashing.
//!
//! A raw password must pass [ValidatedPassword::new] before it can be hashed
//! into a [PasswordHash] and stored.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that is hard enough to guess, but not yet hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// `user_inputs` are words the user has entered elsewhere, such as their
    /// username and email address. Passwords built from them score lower.
    ///
    /// # Errors
    /// Returns [Error::TooWeak] with zxcvbn's suggestions if the password
    /// scores below three out of four.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, user_inputs);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => Err(Error::TooWeak(
                analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// Only for callers that have already validated the password.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A salted bcrypt hash of a password or security answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The recommended bcrypt cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with the given bcrypt `cost`.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if bcrypt fails, e.g. for an out of range cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        Self::hash_str(&password.0, cost)
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Validate then hash `raw_password`. No user inputs are considered.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        Self::new(ValidatedPassword::new(raw_password, &[])?, cost)
    }

    pub(crate) fn hash_str(secret: &str, cost: u32) -> Result<Self, Error> {
        hash(secret, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Check whether `raw_password` hashes to this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Why a new password chosen in a form was not accepted.
#[derive(Debug, PartialEq)]
pub(crate) enum NewPasswordProblem {
    /// The password is too easy to guess, with suggestions for a better one.
    TooWeak(String),
    /// The confirmation does not match the password.
    Mismatch,
}

pub(crate) const PASSWORD_MISMATCH_MSG: &str = "Passwords do not match";

impl NewPasswordProblem {
    /// The message to show under the password field, if any.
    pub(crate) fn password_message(&self) -> Option<String> {
        match self {
            NewPasswordProblem::TooWeak(feedback) => Some(format!("Password is too weak: {feedback}")),
            NewPasswordProblem::Mismatch => None,
        }
    }

    /// The message to show under the confirmation field, if any.
    pub(crate) fn confirm_message(&self) -> Option<String> {
        match self {
            NewPasswordProblem::TooWeak(_) => None,
            NewPasswordProblem::Mismatch => Some(PASSWORD_MISMATCH_MSG.to_owned()),
        }
    }
}

/// Check a new password and its confirmation from a form.
pub(crate) fn validate_new_password(
    password: &str,
    confirm_password: &str,
    user_inputs: &[&str],
) -> Result<ValidatedPassword, NewPasswordProblem> {
    let validated = ValidatedPassword::new(password, user_inputs).map_err(|error| match error {
        Error::TooWeak(feedback) => NewPasswordProblem::TooWeak(feedback),
        other => NewPasswordProblem::TooWeak(other.to_string()),
    })?;

    if password != confirm_password {
        return Err(NewPasswordProblem::Mismatch);
    }

    Ok(validated)
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, auth::ValidatedPassword};

    #[test]
    fn rejects_empty_password() {
        assert!(matches!(
            ValidatedPassword::new("", &[]),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn rejects_short_password() {
        assert!(matches!(
            ValidatedPassword::new("imtooshort", &[]),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn accepts_long_password() {
        assert!(ValidatedPassword::new("asomewhatlongpassword1", &[]).is_ok());
    }

    #[test]
    fn rejects_password_made_of_user_inputs() {
        let password = "zqxwvplorkmnbt";
        let inputs = ["zqxwvplorkmnbt", "zqxwvplorkmnbt@example.com"];

        assert!(ValidatedPassword::new(password, &[]).is_ok());
        assert!(matches!(
            ValidatedPassword::new(password, &inputs),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn new_password_must_match_confirmation() {
        use crate::auth::password::{NewPasswordProblem, validate_new_password};

        let password = "asomewhatlongpassword1";

        assert!(validate_new_password(password, password, &[]).is_ok());
        assert_eq!(
            validate_new_password(password, "asomewhatlongpassword2", &[]),
            Err(NewPasswordProblem::Mismatch)
        );
        assert!(matches!(
            validate_new_password("hunter2", "hunter2", &[]),
            Err(NewPasswordProblem::TooWeak(_))
        ));
    }

    #[test]
    fn display_hides_password() {
        let password = ValidatedPassword::new_unchecked("hunter2");

        assert_eq!(password.to_string(), "********");
    }
}
