//! Database repository for sessions.
//!
//! Sessions do not follow the generic repository contract: the hot path is
//! [`Sessions::touch`], a single statement that validates a token digest and
//! rolls the expiry forward in one round trip.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::Result,
        models::sessions::{AuthSessionDBResponse, SessionCreateDBRequest, SessionDBResponse},
    },
    types::{SessionId, abbrev_uuid},
};

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse> {
        // Always generate a new ID for sessions
        let session_id = Uuid::new_v4();

        let session = sqlx::query_as::<_, SessionDBResponse>(
            r#"
            INSERT INTO sessions (id, user_id, token_digest, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(request.user_id)
        .bind(&request.token_digest)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SessionId) -> Result<Option<SessionDBResponse>> {
        let session = sqlx::query_as::<_, SessionDBResponse>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(session)
    }

    /// Validate a token digest against a live session and roll its expiry
    /// forward by `timeout`, returning the session joined with its user.
    ///
    /// Returns `None` when the digest matches no session or only an expired
    /// one. Expired rows are left for the sweeper.
    #[instrument(skip(self, token_digest, timeout), err)]
    pub async fn touch(&mut self, token_digest: &str, timeout: Duration) -> Result<Option<AuthSessionDBResponse>> {
        let expires_at = Utc::now() + timeout;

        let refreshed = sqlx::query_as::<_, AuthSessionDBResponse>(
            r#"
            UPDATE sessions s
            SET expires_at = $2, last_seen_at = now()
            FROM users u
            WHERE s.token_digest = $1 AND s.expires_at > now() AND u.id = s.user_id
            RETURNING s.id, s.user_id, u.username, u.email, u.created_at, u.updated_at
            "#,
        )
        .bind(token_digest)
        .bind(expires_at)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(refreshed)
    }

    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: SessionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove sessions past their expiry, returning how many were swept.
    #[instrument(skip(self), err)]
    pub async fn delete_expired(&mut self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    };
    use crate::types::UserId;
    use sqlx::PgPool;

    async fn create_user(conn: &mut PgConnection, username: &str) -> UserId {
        let mut repo = Users::new(conn);
        let user = repo
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "argon2-hash-placeholder".to_string(),
            })
            .await
            .unwrap();
        user.id
    }

    fn session_request(user_id: UserId, digest: &str, expires_in: chrono::Duration) -> SessionCreateDBRequest {
        SessionCreateDBRequest {
            user_id,
            token_digest: digest.to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_session(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let mut repo = Sessions::new(&mut conn);
        let session = repo
            .create(&session_request(user_id, "digest-1", chrono::Duration::days(5)))
            .await
            .unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.token_digest, "digest-1");
        assert!(session.expires_at > Utc::now());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_touch_rolls_expiry(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let mut repo = Sessions::new(&mut conn);
        let session = repo
            .create(&session_request(user_id, "digest-roll", chrono::Duration::hours(1)))
            .await
            .unwrap();

        let refreshed = repo
            .touch("digest-roll", Duration::from_secs(5 * 24 * 60 * 60))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(refreshed.id, session.id);
        assert_eq!(refreshed.user_id, user_id);
        assert_eq!(refreshed.username, "alice");
        assert_eq!(refreshed.email, "alice@example.com");

        // The stored expiry moved well past the original one hour
        let row = repo.get_by_id(session.id).await.unwrap().unwrap();
        assert!(row.expires_at > Utc::now() + chrono::Duration::days(4));
        assert!(row.last_seen_at >= row.created_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_touch_unknown_digest(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let refreshed = repo.touch("no-such-digest", Duration::from_secs(60)).await.unwrap();
        assert!(refreshed.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_touch_expired_session(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let mut repo = Sessions::new(&mut conn);
        repo.create(&session_request(user_id, "digest-stale", chrono::Duration::hours(-1)))
            .await
            .unwrap();

        // An expired session is never refreshed back to life
        let refreshed = repo.touch("digest-stale", Duration::from_secs(60)).await.unwrap();
        assert!(refreshed.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_session(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let mut repo = Sessions::new(&mut conn);
        let session = repo
            .create(&session_request(user_id, "digest-del", chrono::Duration::days(1)))
            .await
            .unwrap();

        assert!(repo.delete(session.id).await.unwrap());
        assert!(repo.get_by_id(session.id).await.unwrap().is_none());
        assert!(!repo.delete(session.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_expired(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let mut repo = Sessions::new(&mut conn);
        let live = repo
            .create(&session_request(user_id, "digest-live", chrono::Duration::days(1)))
            .await
            .unwrap();
        repo.create(&session_request(user_id, "digest-old-1", chrono::Duration::hours(-1)))
            .await
            .unwrap();
        repo.create(&session_request(user_id, "digest-old-2", chrono::Duration::days(-3)))
            .await
            .unwrap();

        let swept = repo.delete_expired().await.unwrap();
        assert_eq!(swept, 2);
        assert!(repo.get_by_id(live.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sessions_cascade_on_user_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let session_id = {
            let mut repo = Sessions::new(&mut conn);
            repo.create(&session_request(user_id, "digest-cascade", chrono::Duration::days(1)))
                .await
                .unwrap()
                .id
        };

        {
            let mut users = Users::new(&mut conn);
            assert!(users.delete(user_id).await.unwrap());
        }

        let mut repo = Sessions::new(&mut conn);
        assert!(repo.get_by_id(session_id).await.unwrap().is_none());
    }
}
