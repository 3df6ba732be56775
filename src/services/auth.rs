//! Authentication orchestration
//!
//! Ties the stores, OTP delivery and token issuance together into the
//! account flows: registration, PIN login, token refresh, logout, PIN reset
//! and session validation. All credential failures during login collapse
//! into one error so callers cannot probe which phone numbers exist.
use crate::db::{SessionStore, UserStore};
use crate::error::{AuthError, Result};
use crate::models::{
    AccessClaims, LoginRequest, NewAccount, OtpPurpose, RefreshClaims, RegisterRequest,
    ResetPinRequest, SendOtpRequest, TokenPair, User, UserProfile, VerifyOtpRequest,
};
use crate::security::{hash_pin, verify_pin};
use crate::services::otp::{OtpOutcome, OtpSent, OtpService};
use crate::services::sms::mask_phone;
use crate::services::token::TokenService;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Successful registration or login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    otp: OtpService,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        otp: OtpService,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            sessions,
            otp,
            tokens,
        }
    }

    /// Send an OTP after checking the phone number fits the purpose:
    /// registration wants an unused number, login and PIN reset want a
    /// registered one.
    pub async fn send_otp(&self, request: &SendOtpRequest) -> Result<OtpSent> {
        request.validate()?;

        let existing = self.users.find_by_phone(&request.phone_number).await?;
        match request.purpose {
            OtpPurpose::Register => {
                if existing.is_some() {
                    return Err(AuthError::PhoneAlreadyRegistered);
                }
            }
            OtpPurpose::Login | OtpPurpose::ResetPin => {
                if existing.is_none() {
                    return Err(AuthError::UserNotFound);
                }
            }
        }

        self.otp.send_otp(&request.phone_number, request.purpose).await
    }

    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<OtpOutcome> {
        request.validate()?;
        self.otp
            .verify_otp(&request.phone_number, &request.otp, request.purpose)
            .await
    }

    /// Open an account: conflict checks, PIN hashing, then the atomic
    /// account write, and finally a first token pair
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResult> {
        request.validate()?;

        let email = request
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase());
        let vpa = request.vpa.trim().to_lowercase();

        if self
            .users
            .find_by_phone(&request.phone_number)
            .await?
            .is_some()
        {
            return Err(AuthError::PhoneAlreadyRegistered);
        }
        if let Some(email) = &email {
            if self.users.email_exists(email).await? {
                return Err(AuthError::EmailAlreadyRegistered);
            }
        }
        if self.users.vpa_exists(&vpa).await? {
            return Err(AuthError::VpaAlreadyTaken);
        }

        let pin_hash = hash_pin(&request.pin)?;
        let user = self
            .users
            .create_account(
                &NewAccount {
                    phone_number: request.phone_number.clone(),
                    email,
                    name: request.name.trim().to_string(),
                    vpa,
                },
                &pin_hash,
            )
            .await?;

        let tokens = self.tokens.generate_token_pair(&user, None).await?;

        info!(
            user_id = %user.id,
            phone = %mask_phone(&user.phone_number),
            "User registered"
        );

        Ok(AuthResult {
            user: user.into(),
            tokens,
        })
    }

    /// Phone + PIN login
    ///
    /// Unknown phone, inactive account, missing PIN and wrong PIN all
    /// produce the same InvalidCredentials error.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResult> {
        request.validate()?;

        let user = self
            .users
            .find_by_phone(&request.phone_number)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active() {
            warn!(
                user_id = %user.id,
                status = %user.status.as_str(),
                "Login attempt on non-active account"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let pin_hash = self
            .users
            .transaction_pin_hash(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_pin(&request.pin, &pin_hash)? {
            warn!(
                user_id = %user.id,
                phone = %mask_phone(&request.phone_number),
                "Login with wrong PIN"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self
            .tokens
            .generate_token_pair(&user, request.device_fingerprint.as_deref())
            .await?;

        info!(
            user_id = %user.id,
            phone = %mask_phone(&user.phone_number),
            "User logged in"
        );

        Ok(AuthResult {
            user: user.into(),
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.tokens.verify_refresh_token(refresh_token)?;
        self.tokens.refresh_tokens(&claims).await
    }

    /// Close the calling session
    pub async fn logout(&self, user_id: Uuid, session_id: Uuid) -> Result<()> {
        self.tokens.revoke_token(session_id).await?;
        info!(user_id = %user_id, session_id = %session_id, "User logged out");
        Ok(())
    }

    /// Change the transaction PIN and revoke every session in one store
    /// write, so stolen tokens die with the old PIN
    pub async fn reset_pin(&self, user_id: Uuid, request: ResetPinRequest) -> Result<()> {
        request.validate()?;

        if request.new_pin != request.confirm_pin {
            return Err(AuthError::PinMismatch);
        }
        if request.current_pin == request.new_pin {
            return Err(AuthError::PinUnchanged);
        }

        let pin_hash = self
            .users
            .transaction_pin_hash(user_id)
            .await?
            .ok_or(AuthError::PinNotSet)?;
        if !verify_pin(&request.current_pin, &pin_hash)? {
            return Err(AuthError::IncorrectPin);
        }

        // One store unit of work: a failure leaves both the old PIN and the
        // old sessions in place
        let new_hash = hash_pin(&request.new_pin)?;
        let revoked = self
            .users
            .rotate_pin_and_revoke_sessions(user_id, &new_hash)
            .await?;

        info!(
            user_id = %user_id,
            sessions_revoked = revoked,
            "Transaction PIN reset"
        );

        Ok(())
    }

    /// Resolve validated access claims to a live user, touching the session
    /// activity timestamp on the way. None means the session was revoked or
    /// the user is gone.
    pub async fn validate_user_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<User>> {
        if self.sessions.find_active(session_id, user_id).await?.is_none() {
            return Ok(None);
        }
        let user = match self.users.find_by_id(user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        self.sessions.touch(session_id).await?;
        Ok(Some(user))
    }

    /// Same resolution for refresh claims, without the activity touch
    pub async fn validate_refresh_token(&self, claims: &RefreshClaims) -> Result<Option<User>> {
        if self
            .sessions
            .find_active(claims.session_id, claims.sub)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        self.users.find_by_id(claims.sub).await
    }

    pub async fn get_profile(&self, user_id: Uuid, session_id: Uuid) -> Result<UserProfile> {
        let user = self
            .validate_user_session(user_id, session_id)
            .await?
            .ok_or(AuthError::InvalidSession)?;
        Ok(user.into())
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        self.tokens.verify_access_token(token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        self.tokens.verify_refresh_token(token)
    }
}
