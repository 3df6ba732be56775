//! OTP challenge lifecycle
//!
//! One live challenge per (phone, purpose). Codes are stored as salted
//! digests and consumed on first successful verification. Handles:
//! - Rate limiting (one send per window, enforced in the store write)
//! - Attempt counting with a hard cap
//! - Expiry (10 minutes by default)
use crate::config::OtpSettings;
use crate::db::OtpStore;
use crate::error::{AuthError, Result};
use crate::models::{NewOtpChallenge, OtpPurpose};
use crate::security::{generate_otp_code, hash_otp};
use crate::services::sms::{mask_phone, SmsSender};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a successful send
#[derive(Debug, Clone, Copy)]
pub struct OtpSent {
    /// Seconds until the code expires
    pub expires_in: i64,
}

/// Outcome of a verification attempt that reached a live challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Verified,
    /// Wrong code; the caller should surface how many attempts remain
    Invalid { attempts_left: i32 },
}

#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    sms: Arc<dyn SmsSender>,
    settings: OtpSettings,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, sms: Arc<dyn SmsSender>, settings: OtpSettings) -> Self {
        Self {
            store,
            sms,
            settings,
        }
    }

    /// Generate a fresh code, persist its digest and dispatch it by SMS
    ///
    /// A challenge younger than the rate-limit window blocks the send. SMS
    /// dispatch failure fails the whole operation so the caller never
    /// reports a code that was not delivered.
    pub async fn send_otp(&self, phone_number: &str, purpose: OtpPurpose) -> Result<OtpSent> {
        let code = generate_otp_code();
        let challenge = NewOtpChallenge {
            phone_number: phone_number.to_string(),
            purpose,
            code_hash: hash_otp(&code, &self.settings.salt),
            expires_at: Utc::now() + Duration::seconds(self.settings.expiry_secs),
        };

        let stored = self
            .store
            .put_challenge(&challenge, Duration::seconds(self.settings.rate_limit_secs))
            .await?;
        if !stored {
            warn!(
                phone = %mask_phone(phone_number),
                purpose = %purpose.as_str(),
                "OTP request rate limited"
            );
            return Err(AuthError::OtpRateLimited);
        }

        let message = format!(
            "Your verification code is {}. It is valid for {} minutes. Do not share it with anyone.",
            code,
            self.settings.expiry_secs / 60
        );
        self.sms.send(phone_number, &message).await?;

        info!(
            phone = %mask_phone(phone_number),
            purpose = %purpose.as_str(),
            "OTP sent successfully"
        );

        Ok(OtpSent {
            expires_in: self.settings.expiry_secs,
        })
    }

    /// Check a submitted code against the live challenge
    ///
    /// A matching code consumes the challenge. A wrong code increments the
    /// attempt counter and reports how many attempts remain; once the cap is
    /// reached every further attempt fails regardless of the code.
    pub async fn verify_otp(
        &self,
        phone_number: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<OtpOutcome> {
        let challenge = self
            .store
            .find_challenge(phone_number, purpose)
            .await?
            .ok_or_else(|| {
                warn!(
                    phone = %mask_phone(phone_number),
                    purpose = %purpose.as_str(),
                    "OTP challenge not found"
                );
                AuthError::OtpExpiredOrMissing
            })?;

        if challenge.is_expired(Utc::now()) {
            return Err(AuthError::OtpExpiredOrMissing);
        }
        if challenge.attempts >= self.settings.max_attempts {
            warn!(
                phone = %mask_phone(phone_number),
                purpose = %purpose.as_str(),
                "OTP attempt cap reached"
            );
            return Err(AuthError::OtpAttemptsExceeded);
        }

        if hash_otp(code, &self.settings.salt) != challenge.code_hash {
            let attempts = self.store.record_failed_attempt(phone_number, purpose).await?;
            let attempts_left = (self.settings.max_attempts - attempts).max(0);
            warn!(
                phone = %mask_phone(phone_number),
                purpose = %purpose.as_str(),
                attempts_left = attempts_left,
                "Invalid OTP code attempt"
            );
            return Ok(OtpOutcome::Invalid { attempts_left });
        }

        // Consume the challenge so the code can never be replayed
        self.store.delete_challenge(phone_number, purpose).await?;

        info!(
            phone = %mask_phone(phone_number),
            purpose = %purpose.as_str(),
            "OTP verified successfully"
        );

        Ok(OtpOutcome::Verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::sms::MockSmsSender;

    const PHONE: &str = "+919876543210";

    fn settings() -> OtpSettings {
        OtpSettings {
            salt: "test-salt".to_string(),
            expiry_secs: 600,
            rate_limit_secs: 60,
            max_attempts: 3,
        }
    }

    fn service_with_capture(store: Arc<MemoryStore>) -> (OtpService, Arc<std::sync::Mutex<Vec<String>>>) {
        let messages = Arc::new(std::sync::Mutex::new(Vec::new()));
        let captured = Arc::clone(&messages);
        let mut sms = MockSmsSender::new();
        sms.expect_send().returning(move |_, message| {
            captured.lock().unwrap().push(message.to_string());
            Ok(())
        });
        (
            OtpService::new(store, Arc::new(sms), settings()),
            messages,
        )
    }

    fn code_from_message(message: &str) -> String {
        message
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take(6)
            .collect()
    }

    #[tokio::test]
    async fn test_send_and_verify_consumes_challenge() {
        let store = Arc::new(MemoryStore::new());
        let (service, messages) = service_with_capture(Arc::clone(&store));

        let sent = service.send_otp(PHONE, OtpPurpose::Login).await.unwrap();
        assert_eq!(sent.expires_in, 600);

        let code = code_from_message(&messages.lock().unwrap()[0]);
        let outcome = service
            .verify_otp(PHONE, &code, OtpPurpose::Login)
            .await
            .unwrap();
        assert_eq!(outcome, OtpOutcome::Verified);

        // Consumed: the same code is dead
        let err = service
            .verify_otp(PHONE, &code, OtpPurpose::Login)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpExpiredOrMissing));
    }

    #[tokio::test]
    async fn test_second_send_inside_window_is_rate_limited() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service_with_capture(Arc::clone(&store));

        service.send_otp(PHONE, OtpPurpose::Login).await.unwrap();
        let err = service.send_otp(PHONE, OtpPurpose::Login).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpRateLimited));
    }

    #[tokio::test]
    async fn test_resend_invalidates_previous_code() {
        let store = Arc::new(MemoryStore::new());
        let (service, messages) = service_with_capture(Arc::clone(&store));

        service.send_otp(PHONE, OtpPurpose::Login).await.unwrap();
        let first_code = code_from_message(&messages.lock().unwrap()[0]);

        store.age_challenge(PHONE, OtpPurpose::Login, Duration::seconds(61));
        service.send_otp(PHONE, OtpPurpose::Login).await.unwrap();

        let outcome = service
            .verify_otp(PHONE, &first_code, OtpPurpose::Login)
            .await
            .unwrap();
        // The old code either no longer matches, or matched by a one in a
        // million collision with the new one
        if let OtpOutcome::Invalid { attempts_left } = outcome {
            assert_eq!(attempts_left, 2);
        }
    }

    #[tokio::test]
    async fn test_attempt_cap_locks_out_even_the_right_code() {
        let store = Arc::new(MemoryStore::new());
        let (service, messages) = service_with_capture(Arc::clone(&store));

        service.send_otp(PHONE, OtpPurpose::ResetPin).await.unwrap();
        let code = code_from_message(&messages.lock().unwrap()[0]);
        let wrong = if code == "000000" { "000001" } else { "000000" };

        for expected_left in [2, 1, 0] {
            let outcome = service
                .verify_otp(PHONE, wrong, OtpPurpose::ResetPin)
                .await
                .unwrap();
            assert_eq!(
                outcome,
                OtpOutcome::Invalid {
                    attempts_left: expected_left
                }
            );
        }

        let err = service
            .verify_otp(PHONE, &code, OtpPurpose::ResetPin)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpAttemptsExceeded));
    }

    #[tokio::test]
    async fn test_expired_challenge_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let (service, messages) = service_with_capture(Arc::clone(&store));

        service.send_otp(PHONE, OtpPurpose::Login).await.unwrap();
        let code = code_from_message(&messages.lock().unwrap()[0]);
        store.expire_challenge(PHONE, OtpPurpose::Login);

        let err = service
            .verify_otp(PHONE, &code, OtpPurpose::Login)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OtpExpiredOrMissing));
    }

    #[tokio::test]
    async fn test_sms_failure_fails_the_send() {
        let store = Arc::new(MemoryStore::new());
        let mut sms = MockSmsSender::new();
        sms.expect_send()
            .returning(|_, _| Err(AuthError::SmsDispatch("provider unavailable".to_string())));
        let service = OtpService::new(store, Arc::new(sms), settings());

        let err = service.send_otp(PHONE, OtpPurpose::Login).await.unwrap_err();
        assert!(matches!(err, AuthError::SmsDispatch(_)));
    }
}
