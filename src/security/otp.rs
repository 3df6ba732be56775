//! OTP code hashing and generation
//!
//! OTP codes are short-lived and attempt-limited, so a fast salted digest is
//! enough here - the adaptive cost of Argon2id is reserved for PINs.
use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

/// OTP code length in digits
pub const OTP_LENGTH: usize = 6;

/// Compute the salted SHA-256 hex digest of an OTP code.
///
/// The salt is process-wide (from [`crate::config::OtpSettings`]) so digests
/// in the store are useless without the service configuration.
pub fn hash_otp(code: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random 6-digit numeric code from the OS CSPRNG
pub fn generate_otp_code() -> String {
    OsRng.gen_range(100_000..1_000_000u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_for_same_inputs() {
        assert_eq!(hash_otp("123456", "salt"), hash_otp("123456", "salt"));
    }

    #[test]
    fn test_hash_depends_on_salt() {
        assert_ne!(hash_otp("123456", "salt-a"), hash_otp("123456", "salt-b"));
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let digest = hash_otp("123456", "salt");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..100 {
            let code = generate_otp_code();
            assert_eq!(code.len(), OTP_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
