//! Session persistence (Postgres)
use crate::db::{PgStore, SessionStore};
use crate::error::Result;
use crate::models::{NewSession, Session};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

const SESSION_COLUMNS: &str =
    "id, session_token, user_id, device_id, is_active, started_at, ended_at";

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, session: &NewSession) -> Result<Session> {
        let created = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO sessions (id, session_token, user_id, device_id, is_active, started_at)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&session.session_token)
        .bind(session.user_id)
        .bind(&session.device_id)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;

        Ok(created)
    }

    async fn find_active(&self, session_id: Uuid, user_id: Uuid) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1 AND user_id = $2 AND is_active"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(session)
    }

    async fn deactivate(&self, session_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET is_active = FALSE, ended_at = $1
            WHERE id = $2 AND is_active
            "#,
        )
        .bind(Utc::now())
        .bind(session_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET is_active = FALSE, ended_at = $1
            WHERE user_id = $2 AND is_active
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn touch(&self, session_id: Uuid) -> Result<()> {
        // The start timestamp doubles as the last-activity marker
        sqlx::query("UPDATE sessions SET started_at = $1 WHERE id = $2 AND is_active")
            .bind(Utc::now())
            .bind(session_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
