//! Session lifecycle: login, refresh (with rotation), logout
//!
//! A session lineage occupies exactly one row in the store. Login
//! creates it, each successful refresh overwrites its token and expiry
//! in place, and logout or lazy expiry deletes it. The previous token
//! string dies the instant a rotation commits, which is the whole
//! anti-replay property: presenting the same refresh token twice always
//! fails the second time.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use filedock_db::{Database, NewSession};

use crate::error::AuthError;
use crate::jwt::{JwtManager, TOKEN_TYPE_REFRESH};
use crate::password::verify_password;

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates the session lifecycle against the store and the codec
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    jwt: JwtManager,
}

// A well-formed Argon2 digest that never verifies. Login runs a hash
// comparison even when the email is unknown so the two cases are not
// distinguishable by timing.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

impl SessionManager {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        Self { db, jwt }
    }

    /// Authenticate credentials and open a new session.
    ///
    /// Unknown email, wrong password and inactive account all fail with
    /// the same `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        debug!("Login attempt for: {}", email);

        let user_result = self.db.get_user_by_email(email).await?;

        let (hash_to_verify, user) = match user_result {
            Some(u) => (u.password_hash.clone(), Some(u)),
            None => (DUMMY_HASH.to_string(), None),
        };

        let password_valid = verify_password(password, &hash_to_verify);

        let user = match (user, password_valid) {
            (Some(u), true) if u.is_active => u,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let access_token = self.jwt.generate_access_token(&user)?;
        let refresh_token = self.jwt.generate_refresh_token(&user)?;

        // Last-login stamp and session row commit together
        self.db
            .create_login_session(NewSession {
                user_id: user.id,
                refresh_token: refresh_token.clone(),
                expires_at: Utc::now() + self.jwt.refresh_ttl(),
            })
            .await?;

        info!("User {} logged in", user.email);

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new token pair, rotating the
    /// session in place.
    ///
    /// Every failure mode (bad signature, wrong type, unknown string,
    /// expired row, missing or inactive owner, lost rotation race)
    /// surfaces as the same `InvalidRefreshToken`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt
            .validate_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        if claims.token_type.as_deref() != Some(TOKEN_TYPE_REFRESH) {
            return Err(AuthError::InvalidRefreshToken);
        }

        let session = self
            .db
            .get_session_by_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Lazy expiry: the row is removed when it is found dead, no
        // background sweep needed for correctness.
        if session.expires_at < Utc::now() {
            self.db.delete_session(refresh_token).await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .db
            .get_user_by_id(session.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidRefreshToken)?;

        let access_token = self.jwt.generate_access_token(&user)?;
        let new_refresh_token = self.jwt.generate_refresh_token(&user)?;

        // The rotation UPDATE is keyed on the old token value, so a
        // concurrent refresh racing on the same string has at most one
        // winner; the loser sees zero rows affected.
        let rotated = self
            .db
            .rotate_session(
                refresh_token,
                &new_refresh_token,
                Utc::now() + self.jwt.refresh_ttl(),
            )
            .await?;
        if !rotated {
            return Err(AuthError::InvalidRefreshToken);
        }

        debug!("Rotated session for user {}", user.email);

        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Drop the session for a refresh token.
    ///
    /// Returns whether anything was deleted; no detail about whether
    /// the token was malformed versus simply absent.
    pub async fn logout(&self, refresh_token: &str) -> Result<bool, AuthError> {
        let deleted = self.db.delete_session(refresh_token).await?;
        if deleted {
            info!("Session revoked on logout");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use filedock_db::{NewUser, UpdateUser, User, UserRole};

    use crate::password::hash_password;

    async fn setup() -> (SessionManager, Database, JwtManager) {
        let db = Database::new_in_memory().await.unwrap();
        let jwt = JwtManager::new("test-secret-key", 30, 7);
        (SessionManager::new(db.clone(), jwt.clone()), db, jwt)
    }

    async fn seed_active_user(db: &Database) -> User {
        db.insert_user(NewUser {
            email: "a@x.com".to_string(),
            password_hash: hash_password("secret").unwrap(),
            full_name: Some("Ada".to_string()),
            role: UserRole::Viewer,
            is_active: true,
            allowed_path_prefix: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_returns_tokens_and_touches_last_login() {
        let (sessions, db, _) = setup().await;
        let user = seed_active_user(&db).await;
        assert!(user.last_login_at.is_none());

        let pair = sessions.login("a@x.com", "secret").await.unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());

        let reloaded = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login_at.is_some());
        assert_eq!(db.count_sessions_for_user(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (sessions, db, _) = setup().await;
        let user = seed_active_user(&db).await;

        // Unknown email
        let e1 = sessions.login("nobody@x.com", "secret").await.unwrap_err();
        // Wrong password
        let e2 = sessions.login("a@x.com", "wrong").await.unwrap_err();
        // Inactive account
        db.update_user(
            user.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let e3 = sessions.login("a@x.com", "secret").await.unwrap_err();

        for e in [&e1, &e2, &e3] {
            assert!(matches!(e, AuthError::InvalidCredentials));
        }
        assert_eq!(e1.to_string(), e2.to_string());
        assert_eq!(e2.to_string(), e3.to_string());
    }

    #[tokio::test]
    async fn test_rotation_is_single_use() {
        let (sessions, db, _) = setup().await;
        let user = seed_active_user(&db).await;

        let pair1 = sessions.login("a@x.com", "secret").await.unwrap();
        let t1 = pair1.refresh_token;

        let pair2 = sessions.refresh(&t1).await.unwrap();
        let t2 = pair2.refresh_token;
        assert_ne!(t1, t2);

        // T1 was rotated away and must never work again
        let replay = sessions.refresh(&t1).await;
        assert!(matches!(replay, Err(AuthError::InvalidRefreshToken)));

        // T2 is the live lineage
        assert!(sessions.refresh(&t2).await.is_ok());

        // Still exactly one session row for the whole lineage
        assert_eq!(db.count_sessions_for_user(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_refresh() {
        let (sessions, db, jwt) = setup().await;
        let user = seed_active_user(&db).await;

        // Token signature is fine; only the session row is stale
        let token = jwt.generate_refresh_token(&user).unwrap();
        db.insert_session(NewSession {
            user_id: user.id,
            refresh_token: token.clone(),
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();

        let result = sessions.refresh(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));

        // Lazy expiry removed the row as a side effect
        assert!(db.get_session_by_token(&token).await.unwrap().is_none());
        assert_eq!(db.count_sessions_for_user(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let (sessions, db, jwt) = setup().await;
        let user = seed_active_user(&db).await;

        let access = jwt.generate_access_token(&user).unwrap();
        let result = sessions.refresh(&access).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_fails_for_deactivated_owner() {
        let (sessions, db, _) = setup().await;
        let user = seed_active_user(&db).await;
        let pair = sessions.login("a@x.com", "secret").await.unwrap();

        db.update_user(
            user.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let result = sessions.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_logout_semantics() {
        let (sessions, db, _) = setup().await;
        seed_active_user(&db).await;

        // Unknown token: false, not an error
        assert!(!sessions.logout("unknown-token").await.unwrap());

        let pair = sessions.login("a@x.com", "secret").await.unwrap();
        assert!(sessions.logout(&pair.refresh_token).await.unwrap());

        // The revoked token can no longer refresh
        let result = sessions.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn test_each_login_opens_its_own_session() {
        let (sessions, db, _) = setup().await;
        let user = seed_active_user(&db).await;

        let p1 = sessions.login("a@x.com", "secret").await.unwrap();
        let p2 = sessions.login("a@x.com", "secret").await.unwrap();
        assert_ne!(p1.refresh_token, p2.refresh_token);
        assert_eq!(db.count_sessions_for_user(user.id).await.unwrap(), 2);

        // Logging out one lineage leaves the other alive
        assert!(sessions.logout(&p1.refresh_token).await.unwrap());
        assert!(sessions.refresh(&p2.refresh_token).await.is_ok());
    }
}
