//! User and account persistence (Postgres)
use crate::db::{PgStore, UserStore};
use crate::error::{AuthError, Result};
use crate::models::{NewAccount, User};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, phone_number, email, name, status, kyc_status, tier, created_at, updated_at";

/// Map a unique-constraint violation to the Conflict taxonomy; everything
/// else stays an opaque Database error.
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return match db_err.constraint() {
                Some("users_phone_number_key") => AuthError::PhoneAlreadyRegistered,
                Some("users_email_key") => AuthError::EmailAlreadyRegistered,
                Some("wallets_vpa_key") => AuthError::VpaAlreadyTaken,
                _ => AuthError::Database(db_err.to_string()),
            };
        }
    }
    err.into()
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool())
                .await?;

        Ok(exists)
    }

    async fn vpa_exists(&self, vpa: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM wallets WHERE vpa = $1)")
                .bind(vpa)
                .fetch_one(self.pool())
                .await?;

        Ok(exists)
    }

    async fn create_account(&self, account: &NewAccount, pin_hash: &str) -> Result<User> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, phone_number, email, name, status, kyc_status, tier, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'ACTIVE', 'PENDING', 'BASIC', $5, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.phone_number)
        .bind(&account.email)
        .bind(&account.name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, transaction_pin, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            "#,
        )
        .bind(user.id)
        .bind(pin_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, push_notifications, transaction_alerts, created_at, updated_at)
            VALUES ($1, TRUE, TRUE, $2, $2)
            "#,
        )
        .bind(user.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO wallets (id, user_id, wallet_type, vpa, balance_minor, created_at)
            VALUES ($1, $2, 'PRIMARY', $3, 0, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&account.vpa)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;

        Ok(user)
    }

    async fn transaction_pin_hash(&self, user_id: Uuid) -> Result<Option<String>> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT transaction_pin FROM user_preferences WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;

        Ok(hash)
    }

    async fn rotate_pin_and_revoke_sessions(&self, user_id: Uuid, pin_hash: &str) -> Result<u64> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            UPDATE user_preferences
            SET transaction_pin = $1, updated_at = $2
            WHERE user_id = $3
            "#,
        )
        .bind(pin_hash)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let revoked = sqlx::query(
            r#"
            UPDATE sessions
            SET is_active = FALSE, ended_at = $1
            WHERE user_id = $2 AND is_active
            "#,
        )
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(revoked)
    }
}
