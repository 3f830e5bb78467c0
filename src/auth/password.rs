use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::warn;

use super::AuthError;

/// Hash a password into a PHC string (`$argon2id$...`) with a fresh random
/// salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Backend(anyhow::anyhow!("failed to hash password: {err}")))
}

/// Check `password` against a value produced by [`hash_password`]. Malformed
/// stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let hash = match PasswordHash::new(stored) {
        Ok(hash) => hash,
        Err(err) => {
            warn!(error = %err, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}
