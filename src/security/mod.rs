//! Security primitives for the auth core
//!
//! - **pin**: Argon2id transaction-PIN hashing
//! - **otp**: salted SHA-256 OTP digests and CSPRNG code generation
pub mod otp;
pub mod pin;

pub use otp::{generate_otp_code, hash_otp};
pub use pin::{hash_pin, verify_pin};
