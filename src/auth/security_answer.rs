//! Hashing and checking the answer to a user's security question.
//!
//! Answers are compared case-insensitively and ignoring surrounding
//! whitespace, so "  Rex " matches "rex".

use crate::{Error, auth::PasswordHash};

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Hash the normalized `answer` for storage.
///
/// # Errors
/// Returns [Error::EmptySecurityQuestion] if the answer is blank, or
/// [Error::HashingError] if bcrypt fails.
pub fn hash_security_answer(answer: &str, cost: u32) -> Result<PasswordHash, Error> {
    let answer = normalize(answer);
    if answer.is_empty() {
        return Err(Error::EmptySecurityQuestion);
    }

    PasswordHash::hash_str(&answer, cost)
}

/// Check `answer` against the stored `answer_hash`.
///
/// # Errors
/// Returns [Error::IncorrectSecurityAnswer] if the answer does not match, or
/// [Error::HashingError] if the stored hash is malformed.
pub fn verify_security_answer(answer_hash: &PasswordHash, answer: &str) -> Result<(), Error> {
    match answer_hash.verify(&normalize(answer)) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::IncorrectSecurityAnswer),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}
