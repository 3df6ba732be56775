use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side session record - one per issued refresh-token lineage.
///
/// The session is the single source of truth for whether a token pair is
/// still valid: a signed, unexpired JWT whose `session_id` maps to an
/// inactive or missing row must be rejected.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Row id, embedded in both JWTs as the `session_id` claim
    pub id: Uuid,
    /// Opaque server-generated token (32 random bytes, hex). Never placed
    /// in a JWT claim.
    pub session_token: String,
    pub user_id: Uuid,
    pub device_id: String,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Fields for opening a new session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub device_id: String,
    pub session_token: String,
}
