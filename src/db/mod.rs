//! Persistence boundary for the auth core
//!
//! Three store traits cover the relational surface the services need:
//! - [`UserStore`]: identity rows plus the atomic registration unit of work
//! - [`OtpStore`]: one challenge per (phone, purpose) with conditional upsert
//! - [`SessionStore`]: refresh-token lineage records
//!
//! [`PgStore`] implements all three over one Postgres pool (`users`,
//! `sessions`, `otp` modules). [`MemoryStore`] is a dashmap-backed
//! implementation with the same atomicity guarantees, used by the test
//! suite and local tooling.
pub mod memory;
pub mod otp;
pub mod sessions;
pub mod users;

use crate::config::DatabaseSettings;
use crate::error::Result;
use crate::models::{
    NewAccount, NewOtpChallenge, NewSession, OtpChallenge, OtpPurpose, Session, User,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    async fn vpa_exists(&self, vpa: &str) -> Result<bool>;

    /// Registration unit of work: user + preferences (PIN hash) + settings +
    /// one zero-balance PRIMARY wallet holding the VPA. All four writes
    /// commit or none do.
    async fn create_account(&self, account: &NewAccount, pin_hash: &str) -> Result<User>;

    /// The stored PIN hash, or None when no PIN has been set
    async fn transaction_pin_hash(&self, user_id: Uuid) -> Result<Option<String>>;

    /// Credential rotation unit of work: store the new PIN hash and
    /// deactivate every active session in one transaction, returning how
    /// many sessions were closed. A failure commits neither write.
    async fn rotate_pin_and_revoke_sessions(&self, user_id: Uuid, pin_hash: &str) -> Result<u64>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Create or overwrite the challenge for this (phone, purpose) key in a
    /// single conditional write: an existing challenge younger than
    /// `rate_limit` is left untouched and `false` is returned. This is the
    /// rate-limit check - there is no separate read, so two concurrent sends
    /// cannot both pass it.
    async fn put_challenge(
        &self,
        challenge: &NewOtpChallenge,
        rate_limit: Duration,
    ) -> Result<bool>;

    async fn find_challenge(
        &self,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>>;

    /// Atomically increment the attempt counter, returning the new count
    async fn record_failed_attempt(&self, phone_number: &str, purpose: OtpPurpose) -> Result<i32>;

    async fn delete_challenge(&self, phone_number: &str, purpose: OtpPurpose) -> Result<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: &NewSession) -> Result<Session>;

    /// Look up a session by (id, owner), requiring it to be active
    async fn find_active(&self, session_id: Uuid, user_id: Uuid) -> Result<Option<Session>>;

    /// Deactivate one session and stamp its end time. Idempotent.
    async fn deactivate(&self, session_id: Uuid) -> Result<()>;

    /// Deactivate every active session for a user in one statement,
    /// returning how many were closed
    async fn deactivate_all_for_user(&self, user_id: Uuid) -> Result<u64>;

    /// Refresh the activity timestamp of a live session
    async fn touch(&self, session_id: Uuid) -> Result<()>;
}

/// Postgres-backed implementation of all three store traits
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from settings and run pending migrations
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(settings.acquire_timeout))
            .connect(&settings.url)
            .await
            .context("Failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
