//! Argon2 password hashing. Hashing is CPU bound, so both
//! operations run on the blocking thread pool.
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use error_stack::{Report, Result, ResultExt};
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::util::Sensitive;

#[derive(Debug, Error)]
#[error("failed to hash password")]
pub struct HashError;

// Verified against when the username does not exist so both
// outcomes take about the same time.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"not-a-real-password", &salt)
        .ok()
        .map(|hash| hash.to_string())
});

#[tracing::instrument(name = "password.hash", skip_all)]
pub async fn hash(password: Sensitive<String>) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_str().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Report::new(HashError).attach_printable(e.to_string()))
    })
    .await
    .change_context(HashError)?
}

/// Checks `password` against `hash`. A missing hash is checked
/// against a throwaway one and always fails.
#[tracing::instrument(name = "password.verify", skip_all)]
pub async fn verify(password: &Sensitive<String>, hash: Option<String>) -> bool {
    let password = password.clone();
    let found = hash.is_some();
    let result = tokio::task::spawn_blocking(move || {
        let Some(hash) = hash.or_else(|| DUMMY_HASH.clone()) else {
            return false;
        };
        let Ok(parsed) = PasswordHash::new(&hash) else {
            tracing::warn!("stored password hash is malformed");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok()
    })
    .await;

    match result {
        Ok(matched) => found && matched,
        Err(error) => {
            tracing::error!(%error, "password verification task failed");
            false
        }
    }
}
