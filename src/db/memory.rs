//! In-memory implementation of the store traits
//!
//! Backed by dashmap with the same per-key atomicity the Postgres
//! implementation gets from conditional writes. Used by the test suite and
//! local tooling; no persistence.
use crate::db::{OtpStore, SessionStore, UserStore};
use crate::error::{AuthError, Result};
use crate::models::{
    KycStatus, NewAccount, NewOtpChallenge, NewSession, NotificationSettings, OtpChallenge,
    OtpPurpose, Session, User, UserStatus, UserTier, Wallet, WalletType,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    phone_index: DashMap<String, Uuid>,
    email_index: DashMap<String, Uuid>,
    vpa_index: DashMap<String, Uuid>,
    pins: DashMap<Uuid, String>,
    settings: DashMap<Uuid, NotificationSettings>,
    /// One PRIMARY wallet per user, keyed by owner
    wallets: DashMap<Uuid, Wallet>,
    otps: DashMap<(String, OtpPurpose), OtpChallenge>,
    sessions: DashMap<Uuid, Session>,
    /// Serializes the multi-map units of work (registration, PIN rotation)
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn wallet(&self, user_id: Uuid) -> Option<Wallet> {
        self.wallets.get(&user_id).map(|w| w.clone())
    }

    pub fn notification_settings(&self, user_id: Uuid) -> Option<NotificationSettings> {
        self.settings.get(&user_id).map(|s| *s)
    }

    pub fn active_session_count(&self, user_id: Uuid) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .count()
    }

    pub fn challenge(&self, phone_number: &str, purpose: OtpPurpose) -> Option<OtpChallenge> {
        self.otps
            .get(&(phone_number.to_string(), purpose))
            .map(|c| c.clone())
    }

    pub fn set_user_status(&self, user_id: Uuid, status: UserStatus) {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.status = status;
        }
    }

    /// Rewind a challenge's creation time, e.g. to step past the rate-limit
    /// window without sleeping
    pub fn age_challenge(&self, phone_number: &str, purpose: OtpPurpose, by: Duration) {
        if let Some(mut c) = self.otps.get_mut(&(phone_number.to_string(), purpose)) {
            c.created_at -= by;
        }
    }

    /// Force a challenge past its expiry
    pub fn expire_challenge(&self, phone_number: &str, purpose: OtpPurpose) {
        if let Some(mut c) = self.otps.get_mut(&(phone_number.to_string(), purpose)) {
            c.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        Ok(self
            .phone_index
            .get(phone_number)
            .and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.email_index.contains_key(email))
    }

    async fn vpa_exists(&self, vpa: &str) -> Result<bool> {
        Ok(self.vpa_index.contains_key(vpa))
    }

    async fn create_account(&self, account: &NewAccount, pin_hash: &str) -> Result<User> {
        // All conflict checks and inserts happen under one lock so a failed
        // registration leaves no partial rows behind.
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Internal("store write lock poisoned".to_string()))?;

        if self.phone_index.contains_key(&account.phone_number) {
            return Err(AuthError::PhoneAlreadyRegistered);
        }
        if let Some(email) = &account.email {
            if self.email_index.contains_key(email) {
                return Err(AuthError::EmailAlreadyRegistered);
            }
        }
        if self.vpa_index.contains_key(&account.vpa) {
            return Err(AuthError::VpaAlreadyTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            phone_number: account.phone_number.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            status: UserStatus::Active,
            kyc_status: KycStatus::Pending,
            tier: UserTier::Basic,
            created_at: now,
            updated_at: now,
        };

        self.users.insert(user.id, user.clone());
        self.phone_index.insert(user.phone_number.clone(), user.id);
        if let Some(email) = &user.email {
            self.email_index.insert(email.clone(), user.id);
        }
        self.pins.insert(user.id, pin_hash.to_string());
        self.settings.insert(user.id, NotificationSettings::default());
        self.vpa_index.insert(account.vpa.clone(), user.id);
        self.wallets.insert(
            user.id,
            Wallet {
                id: Uuid::new_v4(),
                user_id: user.id,
                wallet_type: WalletType::Primary,
                vpa: account.vpa.clone(),
                balance_minor: 0,
                created_at: now,
            },
        );

        Ok(user)
    }

    async fn transaction_pin_hash(&self, user_id: Uuid) -> Result<Option<String>> {
        Ok(self.pins.get(&user_id).map(|h| h.clone()))
    }

    async fn rotate_pin_and_revoke_sessions(&self, user_id: Uuid, pin_hash: &str) -> Result<u64> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Internal("store write lock poisoned".to_string()))?;

        self.pins.insert(user_id, pin_hash.to_string());

        let now = Utc::now();
        let mut closed = 0;
        for mut session in self.sessions.iter_mut() {
            if session.user_id == user_id && session.is_active {
                session.is_active = false;
                session.ended_at = Some(now);
                closed += 1;
            }
        }
        Ok(closed)
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn put_challenge(
        &self,
        challenge: &NewOtpChallenge,
        rate_limit: Duration,
    ) -> Result<bool> {
        let now = Utc::now();
        let row = OtpChallenge {
            phone_number: challenge.phone_number.clone(),
            purpose: challenge.purpose,
            code_hash: challenge.code_hash.clone(),
            attempts: 0,
            expires_at: challenge.expires_at,
            created_at: now,
        };

        // The entry API holds the shard lock, making check-and-overwrite
        // atomic per key
        match self
            .otps
            .entry((challenge.phone_number.clone(), challenge.purpose))
        {
            Entry::Occupied(mut existing) => {
                if now - existing.get().created_at < rate_limit {
                    return Ok(false);
                }
                existing.insert(row);
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(row);
                Ok(true)
            }
        }
    }

    async fn find_challenge(
        &self,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>> {
        Ok(self.challenge(phone_number, purpose))
    }

    async fn record_failed_attempt(&self, phone_number: &str, purpose: OtpPurpose) -> Result<i32> {
        let mut challenge = self
            .otps
            .get_mut(&(phone_number.to_string(), purpose))
            .ok_or(AuthError::OtpExpiredOrMissing)?;
        challenge.attempts += 1;
        Ok(challenge.attempts)
    }

    async fn delete_challenge(&self, phone_number: &str, purpose: OtpPurpose) -> Result<()> {
        self.otps.remove(&(phone_number.to_string(), purpose));
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: &NewSession) -> Result<Session> {
        let created = Session {
            id: Uuid::new_v4(),
            session_token: session.session_token.clone(),
            user_id: session.user_id,
            device_id: session.device_id.clone(),
            is_active: true,
            started_at: Utc::now(),
            ended_at: None,
        };
        self.sessions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_active(&self, session_id: Uuid, user_id: Uuid) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .get(&session_id)
            .filter(|s| s.user_id == user_id && s.is_active)
            .map(|s| s.clone()))
    }

    async fn deactivate(&self, session_id: Uuid) -> Result<()> {
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            if session.is_active {
                session.is_active = false;
                session.ended_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let now = Utc::now();
        let mut closed = 0;
        for mut session in self.sessions.iter_mut() {
            if session.user_id == user_id && session.is_active {
                session.is_active = false;
                session.ended_at = Some(now);
                closed += 1;
            }
        }
        Ok(closed)
    }

    async fn touch(&self, session_id: Uuid) -> Result<()> {
        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            if session.is_active {
                session.started_at = Utc::now();
            }
        }
        Ok(())
    }
}
