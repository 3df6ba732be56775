use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Coarse classification of an [`AuthError`], used by transport layers to
/// pick a wire status. Callers branch on this, never on error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    Unauthorized,
    BadRequest,
    Internal,
}

#[derive(Debug, Error)]
pub enum AuthError {
    // Credential failures share one message so a caller cannot tell an
    // unknown phone from a wrong PIN or an inactive account.
    #[error("Invalid phone number or PIN")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Current PIN is incorrect")]
    IncorrectPin,

    #[error("Phone number already registered")]
    PhoneAlreadyRegistered,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("VPA already exists")]
    VpaAlreadyTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("OTP expired or not found")]
    OtpExpiredOrMissing,

    #[error("Please wait before requesting another OTP")]
    OtpRateLimited,

    #[error("Maximum OTP attempts exceeded")]
    OtpAttemptsExceeded,

    #[error("New PIN and confirm PIN do not match")]
    PinMismatch,

    #[error("New PIN must be different from current PIN")]
    PinUnchanged,

    #[error("Transaction PIN not set")]
    PinNotSet,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("SMS dispatch failed: {0}")]
    SmsDispatch(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::InvalidSession
            | AuthError::IncorrectPin => ErrorKind::Unauthorized,

            AuthError::PhoneAlreadyRegistered
            | AuthError::EmailAlreadyRegistered
            | AuthError::VpaAlreadyTaken => ErrorKind::Conflict,

            AuthError::UserNotFound => ErrorKind::NotFound,

            AuthError::OtpExpiredOrMissing
            | AuthError::OtpRateLimited
            | AuthError::OtpAttemptsExceeded
            | AuthError::PinMismatch
            | AuthError::PinUnchanged
            | AuthError::PinNotSet
            | AuthError::Validation(_) => ErrorKind::BadRequest,

            AuthError::SmsDispatch(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_unauthorized() {
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::InvalidToken.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::InvalidSession.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_otp_state_failures_are_bad_request() {
        assert_eq!(AuthError::OtpRateLimited.kind(), ErrorKind::BadRequest);
        assert_eq!(AuthError::OtpAttemptsExceeded.kind(), ErrorKind::BadRequest);
        assert_eq!(AuthError::OtpExpiredOrMissing.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_internal_causes_are_not_exposed_by_kind() {
        assert_eq!(
            AuthError::Database("unique violation on users".into()).kind(),
            ErrorKind::Internal
        );
    }
}
