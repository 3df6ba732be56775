//! OTP challenge persistence (Postgres)
use crate::db::{OtpStore, PgStore};
use crate::error::{AuthError, Result};
use crate::models::{NewOtpChallenge, OtpChallenge, OtpPurpose};
use async_trait::async_trait;
use chrono::Duration;

const OTP_COLUMNS: &str = "phone_number, purpose, code_hash, attempts, expires_at, created_at";

#[async_trait]
impl OtpStore for PgStore {
    async fn put_challenge(
        &self,
        challenge: &NewOtpChallenge,
        rate_limit: Duration,
    ) -> Result<bool> {
        // The rate-limit window is enforced inside the upsert itself: the
        // DO UPDATE only fires when the existing row is old enough, so two
        // concurrent sends cannot both succeed.
        let result = sqlx::query(
            r#"
            INSERT INTO otp_challenges (phone_number, purpose, code_hash, attempts, expires_at, created_at)
            VALUES ($1, $2, $3, 0, $4, NOW())
            ON CONFLICT (phone_number, purpose) DO UPDATE
            SET code_hash = EXCLUDED.code_hash,
                attempts = 0,
                expires_at = EXCLUDED.expires_at,
                created_at = NOW()
            WHERE otp_challenges.created_at <= NOW() - ($5 * INTERVAL '1 second')
            "#,
        )
        .bind(&challenge.phone_number)
        .bind(challenge.purpose)
        .bind(&challenge.code_hash)
        .bind(challenge.expires_at)
        .bind(rate_limit.num_seconds())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_challenge(
        &self,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>> {
        let challenge = sqlx::query_as::<_, OtpChallenge>(&format!(
            "SELECT {OTP_COLUMNS} FROM otp_challenges WHERE phone_number = $1 AND purpose = $2"
        ))
        .bind(phone_number)
        .bind(purpose)
        .fetch_optional(self.pool())
        .await?;

        Ok(challenge)
    }

    async fn record_failed_attempt(&self, phone_number: &str, purpose: OtpPurpose) -> Result<i32> {
        let attempts: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE otp_challenges
            SET attempts = attempts + 1
            WHERE phone_number = $1 AND purpose = $2
            RETURNING attempts
            "#,
        )
        .bind(phone_number)
        .bind(purpose)
        .fetch_optional(self.pool())
        .await?;

        // The challenge can disappear between the hash check and the
        // increment (consumed or replaced); treat that as a dead challenge.
        attempts.ok_or(AuthError::OtpExpiredOrMissing)
    }

    async fn delete_challenge(&self, phone_number: &str, purpose: OtpPurpose) -> Result<()> {
        sqlx::query("DELETE FROM otp_challenges WHERE phone_number = $1 AND purpose = $2")
            .bind(phone_number)
            .bind(purpose)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
