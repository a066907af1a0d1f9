/// Password Hashing and Verification
///
/// bcrypt with a fixed cost. Strength rules live in `validators`.

use bcrypt::{hash, verify};
use lazy_static::lazy_static;

use crate::error::AppError;

pub const HASH_COST: u32 = 10;

lazy_static! {
    // Checked against on logins for unknown emails.
    static ref DUMMY_HASH: String =
        hash("not-a-real-password", HASH_COST).unwrap_or_default();
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Verify against the stored hash, or against a throwaway hash when there is
/// no stored one. Always `false` in the latter case.
pub fn verify_password_or_dummy(password: &str, stored: Option<&str>) -> Result<bool, AppError> {
    match stored {
        Some(hash) => verify_password(password, hash),
        None => {
            let _ = verify(password, DUMMY_HASH.as_str());
            Ok(false)
        }
    }
}
