//! Scoped file operation routes
//!
//! Every handler resolves the caller's identity, checks the permission
//! table, and confines the target to the caller's path restriction
//! before touching the store.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use tracing::{debug, info};

use filedock_auth::{AuthError, Permission, can_access_key, effective_list_prefix};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{
    CreateFolderRequest, CreateFolderResponse, FileDeleteResponse, FileListResponse,
    FileTreeResponse, FileUploadResponse, ListQuery, UploadQuery,
};

/// GET /api/v1/files
async fn list_files(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    identity.require_permission(Permission::FilesRead)?;
    let effective = effective_list_prefix(identity.path_restriction(), &query.prefix)?;

    let files = state.store.list(&effective, query.max_keys).await?;
    let total = files.len();

    Ok(Json(FileListResponse {
        files,
        total,
        prefix: Some(query.prefix).filter(|p| !p.is_empty()),
    }))
}

/// GET /api/v1/files/tree
async fn list_tree(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileTreeResponse>, ApiError> {
    identity.require_permission(Permission::FilesRead)?;
    let effective = effective_list_prefix(identity.path_restriction(), &query.prefix)?;

    let listing = state.store.list_with_folders(&effective).await?;

    Ok(Json(FileTreeResponse {
        folders: listing.folders,
        files: listing.files,
        prefix: listing.prefix,
    }))
}

/// POST /api/v1/files/upload?filename=...&path=...
///
/// The body is the raw file content. Without an explicit path the file
/// lands under the caller's restriction root, or under a per-user
/// prefix when unrestricted.
async fn upload_file(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<FileUploadResponse>), ApiError> {
    identity.require_permission(Permission::FilesWrite)?;

    if query.filename.is_empty() || query.filename.contains('/') {
        return Err(ApiError::BadRequest("Invalid filename".to_string()));
    }

    let key = match (&query.path, identity.path_restriction()) {
        (Some(path), _) if !path.trim().is_empty() => {
            format!("{}/{}", path.trim().trim_end_matches('/'), query.filename)
        }
        (_, Some(restriction)) => {
            format!("{}/{}", restriction.trim_end_matches('/'), query.filename)
        }
        (_, None) => format!("{}/{}", identity.id, query.filename),
    };

    if !can_access_key(identity.path_restriction(), &key) {
        return Err(AuthError::Forbidden.into());
    }

    let size = body.len();
    state.store.put(&key, body).await?;

    info!("Uploaded {} ({} bytes) for {}", key, size, identity.email);

    Ok((
        StatusCode::CREATED,
        Json(FileUploadResponse {
            key,
            filename: query.filename,
            size,
        }),
    ))
}

/// GET /api/v1/files/download/{key}
async fn download_file(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_permission(Permission::FilesRead)?;

    if !can_access_key(identity.path_restriction(), &key) {
        return Err(AuthError::Forbidden.into());
    }

    let data = state.store.get(&key).await?;
    let filename = key.rsplit('/').next().unwrap_or(&key).to_string();

    debug!("Download {} for {}", key, identity.email);

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    ))
}

/// DELETE /api/v1/files/{key}
async fn delete_file(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FileDeleteResponse>, ApiError> {
    identity.require_permission(Permission::FilesDelete)?;

    if !can_access_key(identity.path_restriction(), &key) {
        return Err(AuthError::Forbidden.into());
    }

    let deleted = state.store.delete(&key).await?;
    if deleted {
        info!("Deleted {} for {}", key, identity.email);
    }

    Ok(Json(FileDeleteResponse { key, deleted }))
}

/// POST /api/v1/files/folder
///
/// Creates a folder by writing a `.keep` placeholder object under it.
async fn create_folder(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<CreateFolderResponse>), ApiError> {
    identity.require_permission(Permission::FilesWrite)?;

    let folder = request.path.trim().trim_matches('/').to_string();
    if folder.is_empty() {
        return Err(ApiError::BadRequest("Folder path cannot be empty".to_string()));
    }

    if !can_access_key(identity.path_restriction(), &folder) {
        return Err(AuthError::Forbidden.into());
    }

    let placeholder = format!("{}/.keep", folder);
    state.store.put(&placeholder, Bytes::new()).await?;

    info!("Created folder {} for {}", folder, identity.email);

    Ok((
        StatusCode::CREATED,
        Json(CreateFolderResponse {
            key: format!("{}/", folder),
        }),
    ))
}

/// Create file routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/files", get(list_files))
        .route("/api/v1/files/tree", get(list_tree))
        .route("/api/v1/files/upload", post(upload_file))
        .route("/api/v1/files/download/{*key}", get(download_file))
        .route("/api/v1/files/folder", post(create_folder))
        .route("/api/v1/files/{*key}", delete(delete_file))
}
