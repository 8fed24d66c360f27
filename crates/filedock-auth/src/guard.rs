//! Authorization guard
//!
//! Composes the permission table and the path scope evaluator into one
//! explicit check invoked at the top of each guarded operation. No
//! framework plumbing lives here; the routing layer adapts the result
//! to its transport.

use serde::Serialize;
use tracing::debug;

use filedock_db::{Database, User, UserRole};

use crate::error::AuthError;
use crate::jwt::{JwtManager, TOKEN_TYPE_REFRESH};
use crate::permissions::{Permission, has_permission};
use crate::scope::can_access_key;

/// Resolved identity of an authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub allowed_path_prefix: Option<String>,
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            allowed_path_prefix: user.path_restriction().map(str::to_string),
        }
    }

    /// Effective path restriction. Admins bypass scoping entirely.
    pub fn path_restriction(&self) -> Option<&str> {
        if self.role.is_admin() {
            return None;
        }
        self.allowed_path_prefix.as_deref()
    }

    /// Require a permission from the static table
    pub fn require_permission(&self, permission: Permission) -> Result<(), AuthError> {
        if has_permission(self.role, permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Require one of the given roles
    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), AuthError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Guard resolving bearer tokens to identities and gating operations
#[derive(Clone)]
pub struct AuthGuard {
    db: Database,
    jwt: JwtManager,
}

impl AuthGuard {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        Self { db, jwt }
    }

    /// Resolve a bearer access token to an identity.
    ///
    /// The user record is re-read from the store on every call so a
    /// deactivated account or changed role takes effect immediately,
    /// not at token expiry.
    pub async fn authenticate(&self, bearer_token: &str) -> Result<Identity, AuthError> {
        let claims = self
            .jwt
            .validate_token(bearer_token)
            .map_err(|_| AuthError::Unauthenticated)?;

        // A refresh token is not an access credential
        if claims.token_type.as_deref() == Some(TOKEN_TYPE_REFRESH) {
            return Err(AuthError::Unauthenticated);
        }

        let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::Unauthenticated)?;
        let user = self
            .db
            .get_user_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::Unauthenticated)?;

        debug!("Authenticated user: {} ({})", user.email, user.role.as_str());
        Ok(Identity::from_user(&user))
    }

    /// Resolve identity, check the permission table, and (for storage
    /// operations) check that the target key is within scope.
    pub async fn authorize(
        &self,
        bearer_token: &str,
        permission: Permission,
        target_key: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let identity = self.authenticate(bearer_token).await?;
        identity.require_permission(permission)?;

        if let Some(key) = target_key {
            if !can_access_key(identity.path_restriction(), key) {
                return Err(AuthError::Forbidden);
            }
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedock_db::NewUser;

    use crate::password::hash_password;

    async fn seeded_guard() -> (AuthGuard, Database, JwtManager) {
        let db = Database::new_in_memory().await.unwrap();
        let jwt = JwtManager::new("test-secret-key", 30, 7);
        (AuthGuard::new(db.clone(), jwt.clone()), db, jwt)
    }

    async fn seed_user(db: &Database, role: UserRole, prefix: Option<&str>) -> User {
        db.insert_user(NewUser {
            email: format!("{}@x.com", role.as_str()),
            password_hash: hash_password("secret").unwrap(),
            full_name: None,
            role,
            is_active: true,
            allowed_path_prefix: prefix.map(str::to_string),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_viewer_can_read_but_not_delete() {
        let (guard, db, jwt) = seeded_guard().await;
        let user = seed_user(&db, UserRole::Viewer, None).await;
        let token = jwt.generate_access_token(&user).unwrap();

        let identity = guard
            .authorize(&token, Permission::FilesRead, None)
            .await
            .unwrap();
        assert_eq!(identity.id, user.id);

        let denied = guard.authorize(&token, Permission::FilesDelete, None).await;
        assert!(matches!(denied, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access_credential() {
        let (guard, db, jwt) = seeded_guard().await;
        let user = seed_user(&db, UserRole::Admin, None).await;
        let refresh = jwt.generate_refresh_token(&user).unwrap();

        let result = guard.authenticate(&refresh).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_deactivated_user_loses_access_immediately() {
        let (guard, db, jwt) = seeded_guard().await;
        let user = seed_user(&db, UserRole::Editor, None).await;
        let token = jwt.generate_access_token(&user).unwrap();

        assert!(guard.authenticate(&token).await.is_ok());

        db.update_user(
            user.id,
            filedock_db::UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let result = guard.authenticate(&token).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_scoped_user_confined_to_subtree() {
        let (guard, db, jwt) = seeded_guard().await;
        let user = seed_user(&db, UserRole::Editor, Some("team/alpha")).await;
        let token = jwt.generate_access_token(&user).unwrap();

        assert!(guard
            .authorize(&token, Permission::FilesRead, Some("team/alpha/report.csv"))
            .await
            .is_ok());

        let denied = guard
            .authorize(&token, Permission::FilesRead, Some("team/beta/report.csv"))
            .await;
        assert!(matches!(denied, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_bypasses_scope() {
        let (guard, db, jwt) = seeded_guard().await;
        // Even a stray restriction on an admin row does not confine it
        let user = seed_user(&db, UserRole::Admin, Some("team/alpha")).await;
        let token = jwt.generate_access_token(&user).unwrap();

        assert!(guard
            .authorize(&token, Permission::FilesDelete, Some("team/beta/x"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        let (guard, _db, _jwt) = seeded_guard().await;
        let result = guard.authenticate("not-a-token").await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
}
