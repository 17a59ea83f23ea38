//! Password hashing.
//!
//! Hashes are Argon2id PHC strings. Both directions are CPU-bound, so they
//! run on the blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::BusinessError;

/// Hashes `password` with a fresh salt.
pub(crate) async fn hash(password: String) -> Result<String, BusinessError> {
    blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
}

/// Returns `true` if `password` matches the stored `phc` hash.
pub(crate) async fn verify(password: String, phc: String) -> Result<bool, BusinessError> {
    blocking(move || {
        let parsed = PasswordHash::new(&phc)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(err),
        }
    })
    .await
}

async fn blocking<T, F>(f: F) -> Result<T, BusinessError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, password_hash::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| BusinessError::Password(err.to_string()))?
        .map_err(|err| BusinessError::Password(err.to_string()))
}
