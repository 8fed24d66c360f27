//! Admin user management routes
//!
//! Every route here requires the admin role. Unlike login, these
//! endpoints do distinguish 404 from 403: admins are entitled to know
//! whether a user exists.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use std::str::FromStr;
use tracing::{debug, info};

use filedock_auth::{access_rules, hash_password, AccessRule};
use filedock_db::{NewUser, UpdateUser, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequireAdmin, validate_email, validate_new_password};
use super::types::{
    CreateUserRequest, DiscoverPathsQuery, DiscoverPathsResponse, PathPrefixOption,
    UpdateUserRequest, UserResponse, UserStatsResponse,
};

/// GET /api/v1/users (admin only)
async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/v1/users (admin only)
async fn create_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&request.email)?;
    validate_new_password(&request.password)?;

    debug!("Creating user: {}", request.email);

    let role = UserRole::from_str(&request.role)
        .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", request.role)))?;

    let password_hash = hash_password(&request.password)?;
    let allowed_path_prefix = request
        .allowed_path_prefix
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let user = state
        .db
        .insert_user(NewUser {
            email: request.email,
            password_hash,
            full_name: request.full_name,
            role,
            is_active: request.is_active,
            allowed_path_prefix,
        })
        .await?;

    info!("Created user: {}", user.email);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/{id} (admin only)
async fn get_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;
    Ok(Json(user.into()))
}

/// PUT /api/v1/users/{id} (admin only)
async fn update_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Updating user: {}", id);

    if let Some(email) = &request.email {
        validate_email(email)?;
    }

    let role = request
        .role
        .as_deref()
        .map(|r| {
            UserRole::from_str(r).map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", r)))
        })
        .transpose()?;

    // An empty prefix in the request clears the restriction
    let allowed_path_prefix = request
        .allowed_path_prefix
        .map(|p| Some(p.trim().to_string()).filter(|p| !p.is_empty()));

    let user = state
        .db
        .update_user(
            id,
            UpdateUser {
                email: request.email,
                full_name: request.full_name,
                role,
                is_active: request.is_active,
                allowed_path_prefix,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    if let Some(password) = &request.password {
        validate_new_password(password)?;
        let password_hash = hash_password(password)?;
        state.db.update_user_password(id, &password_hash).await?;
    }

    info!("Updated user: {}", user.email);

    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/{id} (admin only)
async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if admin.id == id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    debug!("Deleting user: {}", id);

    let deleted = state.db.delete_user(id).await?;
    if deleted {
        info!("Deleted user: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User: {}", id)))
    }
}

/// GET /api/v1/users/stats (admin only)
async fn user_stats(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    Ok(Json(UserStatsResponse {
        total_users: state.db.count_users().await?,
        active_users: state.db.count_active_users().await?,
    }))
}

/// GET /api/v1/users/access-rules (admin only)
async fn list_access_rules(
    _admin: RequireAdmin,
) -> Json<&'static [AccessRule]> {
    Json(access_rules())
}

/// GET /api/v1/users/path-prefixes (admin only)
async fn list_path_prefixes(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Json<Vec<PathPrefixOption>> {
    let options = state
        .named_prefixes
        .iter()
        .map(|p| PathPrefixOption {
            value: p.clone(),
            label: p.rsplit('/').next().unwrap_or(p).to_string(),
        })
        .collect();
    Json(options)
}

/// GET /api/v1/users/discover-paths (admin only)
///
/// Lists the folders found at a storage prefix (default: root) as
/// restriction options, so the admin panel can offer real paths
/// instead of free-text entry.
async fn discover_paths(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<DiscoverPathsQuery>,
) -> Result<Json<DiscoverPathsResponse>, ApiError> {
    let listing = state.store.list_with_folders(&query.prefix).await?;

    let prefixes = listing
        .folders
        .into_iter()
        .map(|f| PathPrefixOption {
            value: f.key.trim_end_matches('/').to_string(),
            label: f.name,
        })
        .collect();

    Ok(Json(DiscoverPathsResponse {
        prefixes,
        prefix: listing.prefix,
    }))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/stats", get(user_stats))
        .route("/api/v1/users/access-rules", get(list_access_rules))
        .route("/api/v1/users/path-prefixes", get(list_path_prefixes))
        .route("/api/v1/users/discover-paths", get(discover_paths))
        .route("/api/v1/users/{id}", get(get_user))
        .route("/api/v1/users/{id}", put(update_user))
        .route("/api/v1/users/{id}", delete(delete_user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    use filedock_auth::{AuthGuard, Identity, JwtManager, SessionManager};
    use filedock_db::Database;
    use filedock_storage::FileStore;

    async fn test_state() -> AppState {
        let db = Database::new_in_memory().await.unwrap();
        let jwt = JwtManager::new("test-secret-key", 30, 7);
        let store = FileStore::new_in_memory();
        AppState::new(
            db.clone(),
            store,
            SessionManager::new(db.clone(), jwt.clone()),
            AuthGuard::new(db, jwt),
            vec![],
        )
    }

    fn admin() -> RequireAdmin {
        RequireAdmin(Identity {
            id: 1,
            email: "admin@x.com".to_string(),
            role: UserRole::Admin,
            allowed_path_prefix: None,
        })
    }

    #[tokio::test]
    async fn test_discover_paths_lists_folders_at_root() {
        let state = test_state().await;
        state
            .store
            .put("team/alpha/a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        state
            .store
            .put("team/beta/b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        let Json(response) = discover_paths(
            admin(),
            State(state),
            Query(DiscoverPathsQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.prefixes.len(), 1);
        assert_eq!(response.prefixes[0].value, "team");
        assert_eq!(response.prefixes[0].label, "team");
    }

    #[tokio::test]
    async fn test_discover_paths_descends_into_prefix() {
        let state = test_state().await;
        state
            .store
            .put("team/alpha/a.txt", Bytes::from_static(b"a"))
            .await
            .unwrap();
        state
            .store
            .put("team/beta/sub/b.txt", Bytes::from_static(b"b"))
            .await
            .unwrap();

        let Json(response) = discover_paths(
            admin(),
            State(state),
            Query(DiscoverPathsQuery {
                prefix: "team".to_string(),
            }),
        )
        .await
        .unwrap();

        let values: Vec<&str> = response.prefixes.iter().map(|p| p.value.as_str()).collect();
        assert_eq!(values, ["team/alpha", "team/beta"]);
        // Options never carry a trailing separator
        assert!(response.prefixes.iter().all(|p| !p.value.ends_with('/')));
        assert_eq!(response.prefix.as_deref(), Some("team"));
    }
}
