//! Refresh-token session operations

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewSession, Session};

use super::Database;

impl Database {
    /// Create a new session
    pub async fn insert_session(&self, session: NewSession) -> Result<Session, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (user_id, refresh_token, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(session.user_id)
        .bind(&session.refresh_token)
        .bind(session.expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Session {
            id,
            user_id: session.user_id,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
            created_at: now,
        })
    }

    /// Record a successful login: stamp the user's last-login time and
    /// open the session row in one transaction.
    pub async fn create_login_session(&self, session: NewSession) -> Result<Session, DbError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(session.user_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO sessions (user_id, refresh_token, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(session.user_id)
        .bind(&session.refresh_token)
        .bind(session.expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;
        let id: i64 = result.get("id");

        tx.commit().await?;

        Ok(Session {
            id,
            user_id: session.user_id,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
            created_at: now,
        })
    }

    /// Get a session by its refresh token
    pub async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, refresh_token, expires_at, created_at
            FROM sessions
            WHERE refresh_token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Session::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Rotate a session in place: replace the token and expiry on the
    /// existing row, guarded by the old token value.
    ///
    /// The WHERE clause matches the old token, not the row id, so two
    /// concurrent rotations of the same token have at most one winner:
    /// the loser's UPDATE affects zero rows and reports `false`.
    pub async fn rotate_session(
        &self,
        old_token: &str,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET refresh_token = ?, expires_at = ?
            WHERE refresh_token = ?
            "#,
        )
        .bind(new_token)
        .bind(expires_at.to_rfc3339())
        .bind(old_token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a session by its refresh token
    pub async fn delete_session(&self, token: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE refresh_token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session that expired before `now`
    ///
    /// Expiry is enforced lazily at refresh time; this sweep is storage
    /// hygiene only.
    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count sessions belonging to a user
    pub async fn count_sessions_for_user(&self, user_id: i64) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}
