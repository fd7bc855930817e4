//! Password hashing.

use imghost_common::{Error, Result};

/// Bcrypt work factor used for stored password hashes.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| Error::internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
