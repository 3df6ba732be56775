use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::Validate;

/// What an OTP challenge authorizes, matching database otp_purpose.
/// Part of the challenge key: one live challenge per (phone, purpose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "otp_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Register,
    ResetPin,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::Register => "register",
            OtpPurpose::ResetPin => "reset_pin",
        }
    }
}

/// One active OTP challenge per (phone, purpose)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OtpChallenge {
    pub phone_number: String,
    pub purpose: OtpPurpose,
    /// Salted SHA-256 hex digest of the 6-digit code
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Fields for creating or overwriting a challenge
#[derive(Debug, Clone)]
pub struct NewOtpChallenge {
    pub phone_number: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// OTP send request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(custom(function = "crate::validators::validate_phone_number_validator"))]
    pub phone_number: String,
    pub purpose: OtpPurpose,
}

/// OTP verification request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "crate::validators::validate_phone_number_validator"))]
    pub phone_number: String,
    #[validate(custom(function = "crate::validators::validate_otp_code_validator"))]
    pub otp: String,
    pub purpose: OtpPurpose,
}
