//! Transaction-PIN hashing and verification using Argon2id
use crate::error::{AuthError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a transaction PIN using the Argon2id algorithm
///
/// PINs are 4-6 digits and therefore low entropy; the adaptive cost of
/// Argon2id is what makes offline guessing expensive. A random 16-byte salt
/// is generated per hash.
///
/// Format checks happen at the validation boundary - a malformed PIN here is
/// a programming error, not a runtime failure, so this only errors if the
/// hashing operation itself fails.
pub fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let pin_hash = argon2
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("PIN hashing failed: {}", e)))?
        .to_string();

    Ok(pin_hash)
}

/// Verify a transaction PIN against its stored hash
///
/// Uses the hash function's own constant-time verify. Returns `Ok(false)` on
/// mismatch; errors only when the stored hash is not valid PHC format.
pub fn verify_pin(pin: &str, pin_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(pin_hash)
        .map_err(|e| AuthError::Internal(format!("Invalid PIN hash format: {}", e)))?;

    match Argon2::default().verify_password(pin.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!(
            "PIN verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_pin() {
        let hash = hash_pin("123456").expect("should hash PIN successfully");
        assert!(verify_pin("123456", &hash).expect("should verify successfully"));
    }

    #[test]
    fn test_verify_wrong_pin() {
        let hash = hash_pin("123456").expect("should hash PIN successfully");
        assert!(!verify_pin("654321", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_different_hashes_for_same_pin() {
        let hash1 = hash_pin("4321").expect("should hash successfully");
        let hash2 = hash_pin("4321").expect("should hash successfully");
        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_garbage_stored_hash_is_an_error() {
        let result = verify_pin("1234", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }
}
