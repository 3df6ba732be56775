use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-token claims. Short-lived; presented on every protected call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - the owning user id
    pub sub: Uuid,
    pub phone_number: String,
    pub email: Option<String>,
    /// Account status doubles as the coarse role until dedicated roles exist
    pub role: String,
    pub tier: String,
    pub session_id: Uuid,
    pub device_id: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Refresh-token claims. Longer-lived; accepted only by the refresh
/// operation, and only while the named session is still active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub session_id: Uuid,
    /// Reserved for coarse revocation without touching the session table
    pub token_version: i32,
    pub iat: i64,
    pub exp: i64,
}

/// Access + refresh token issued together, sharing one session id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access-token lifetime in seconds
    pub expires_in: i64,
}
