//! JWT issuance and session lineage
//!
//! Every token pair is anchored to a server-side session row; the session id
//! travels in both tokens and revocation flips the row, so a signed token is
//! never sufficient on its own. Access and refresh tokens are signed with
//! separate HS256 secrets.
use crate::config::JwtSettings;
use crate::db::{SessionStore, UserStore};
use crate::error::{AuthError, Result};
use crate::models::{AccessClaims, NewSession, RefreshClaims, TokenPair, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Stamped into refresh claims; bumping it invalidates every refresh token
/// issued before the bump
const REFRESH_TOKEN_VERSION: i32 = 1;

/// Opaque per-session secret, stored server-side and never embedded in a JWT
fn random_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn random_device_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct TokenService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    jwt: JwtSettings,
}

impl TokenService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>, jwt: JwtSettings) -> Self {
        Self {
            users,
            sessions,
            jwt,
        }
    }

    /// Open a new session for the user and sign a token pair against it
    ///
    /// When the client supplies no device identifier a random one is minted,
    /// so every session always names a device.
    pub async fn generate_token_pair(
        &self,
        user: &User,
        device_id: Option<&str>,
    ) -> Result<TokenPair> {
        let device_id = match device_id {
            Some(id) => id.to_string(),
            None => random_device_id(),
        };

        let session = self
            .sessions
            .create_session(&NewSession {
                user_id: user.id,
                device_id: device_id.clone(),
                session_token: random_session_token(),
            })
            .await?;

        let now = Utc::now();
        let access_claims = AccessClaims {
            sub: user.id,
            phone_number: user.phone_number.clone(),
            email: user.email.clone(),
            role: user.status.as_str().to_string(),
            tier: user.tier.as_str().to_string(),
            session_id: session.id,
            device_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.jwt.access_expiry_secs)).timestamp(),
        };
        let refresh_claims = RefreshClaims {
            sub: user.id,
            session_id: session.id,
            token_version: REFRESH_TOKEN_VERSION,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.jwt.refresh_expiry_secs)).timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt.access_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {}", e)))?;
        let refresh_token = encode(
            &Header::default(),
            &refresh_claims,
            &EncodingKey::from_secret(self.jwt.refresh_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to sign refresh token: {}", e)))?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_expiry_secs,
        })
    }

    /// Exchange validated refresh claims for a fresh pair
    ///
    /// The named session must still be active and its owner must still
    /// exist. The new pair opens its own session on the same device; the
    /// old session stays live until its refresh token expires or is
    /// revoked.
    pub async fn refresh_tokens(&self, claims: &RefreshClaims) -> Result<TokenPair> {
        let session = self
            .sessions
            .find_active(claims.session_id, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(
                    user_id = %claims.sub,
                    session_id = %claims.session_id,
                    "Refresh against inactive or unknown session"
                );
                AuthError::InvalidSession
            })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        self.generate_token_pair(&user, Some(&session.device_id)).await
    }

    /// Revoke one session; its tokens stop working immediately
    pub async fn revoke_token(&self, session_id: Uuid) -> Result<()> {
        self.sessions.deactivate(session_id).await?;
        info!(session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Revoke every active session the user holds
    pub async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<u64> {
        let revoked = self.sessions.deactivate_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked = revoked, "Revoked all user sessions");
        Ok(revoked)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.jwt.access_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            warn!(error = %e, "Access token rejected");
            AuthError::InvalidToken
        })
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.jwt.refresh_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            warn!(error = %e, "Refresh token rejected");
            AuthError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{KycStatus, UserStatus, UserTier};

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_expiry_secs: 900,
            refresh_expiry_secs: 604800,
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            phone_number: "+919876543210".to_string(),
            email: Some("user@example.com".to_string()),
            name: "Test User".to_string(),
            status: UserStatus::Active,
            kyc_status: KycStatus::Pending,
            tier: UserTier::Basic,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(store: &Arc<MemoryStore>) -> TokenService {
        TokenService::new(
            Arc::clone(store) as Arc<dyn UserStore>,
            Arc::clone(store) as Arc<dyn SessionStore>,
            jwt_settings(),
        )
    }

    #[tokio::test]
    async fn test_claims_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let user = test_user();

        let pair = service
            .generate_token_pair(&user, Some("device-1"))
            .await
            .unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);

        let access = service.verify_access_token(&pair.access_token).unwrap();
        let refresh = service.verify_refresh_token(&pair.refresh_token).unwrap();

        assert_eq!(access.sub, user.id);
        assert_eq!(access.phone_number, user.phone_number);
        assert_eq!(access.role, "ACTIVE");
        assert_eq!(access.tier, "BASIC");
        assert_eq!(access.device_id, "device-1");
        assert_eq!(refresh.sub, user.id);
        assert_eq!(refresh.session_id, access.session_id);
        assert_eq!(refresh.token_version, 1);
    }

    #[tokio::test]
    async fn test_tokens_do_not_cross_verify() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let pair = service
            .generate_token_pair(&test_user(), None)
            .await
            .unwrap();

        // Each token only verifies against its own secret
        assert!(service.verify_access_token(&pair.refresh_token).is_err());
        assert!(service.verify_refresh_token(&pair.access_token).is_err());
    }

    #[tokio::test]
    async fn test_refresh_fails_after_revocation() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let user = test_user();
        store
            .create_account(
                &crate::models::NewAccount {
                    phone_number: user.phone_number.clone(),
                    email: user.email.clone(),
                    name: user.name.clone(),
                    vpa: "user@bank".to_string(),
                },
                "hash",
            )
            .await
            .unwrap();
        let user = store
            .find_by_phone(&user.phone_number)
            .await
            .unwrap()
            .unwrap();

        let pair = service.generate_token_pair(&user, None).await.unwrap();
        let claims = service.verify_refresh_token(&pair.refresh_token).unwrap();

        service.revoke_token(claims.session_id).await.unwrap();
        let err = service.refresh_tokens(&claims).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSession));
    }

    #[tokio::test]
    async fn test_revoke_all_kills_every_refresh_lineage() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let user = test_user();

        let first = service
            .generate_token_pair(&user, Some("phone"))
            .await
            .unwrap();
        let second = service
            .generate_token_pair(&user, Some("tablet"))
            .await
            .unwrap();

        assert_eq!(service.revoke_all_user_tokens(user.id).await.unwrap(), 2);

        for pair in [first, second] {
            let claims = service.verify_refresh_token(&pair.refresh_token).unwrap();
            let err = service.refresh_tokens(&claims).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidSession));
        }
    }

    #[tokio::test]
    async fn test_refresh_opens_a_new_session_on_same_device() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        store
            .create_account(
                &crate::models::NewAccount {
                    phone_number: "+919876543210".to_string(),
                    email: None,
                    name: "Test User".to_string(),
                    vpa: "user@bank".to_string(),
                },
                "hash",
            )
            .await
            .unwrap();
        let user = store
            .find_by_phone("+919876543210")
            .await
            .unwrap()
            .unwrap();

        let pair = service
            .generate_token_pair(&user, Some("device-9"))
            .await
            .unwrap();
        let old_claims = service.verify_refresh_token(&pair.refresh_token).unwrap();

        let new_pair = service.refresh_tokens(&old_claims).await.unwrap();
        let new_access = service.verify_access_token(&new_pair.access_token).unwrap();

        assert_ne!(new_access.session_id, old_claims.session_id);
        assert_eq!(new_access.device_id, "device-9");
        assert_eq!(store.active_session_count(user.id), 2);
    }

    #[tokio::test]
    async fn test_expired_access_token_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        // Hand-craft claims already past expiry, beyond the default leeway
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            phone_number: "+919876543210".to_string(),
            email: None,
            role: "ACTIVE".to_string(),
            tier: "BASIC".to_string(),
            session_id: Uuid::new_v4(),
            device_id: "device-1".to_string(),
            iat: now - 1200,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt_settings().access_secret.as_bytes()),
        )
        .unwrap();

        let err = service.verify_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
