//! Request/Response DTOs

use serde::{Deserialize, Serialize};

use filedock_db::User;
use filedock_storage::{FolderEntry, ObjectInfo};

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair response
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Refresh / logout request
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Logout response
#[derive(Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Public signup request (role is always viewer, backend enforced)
#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

// ==================== User Types ====================

/// Create user request (admin)
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub allowed_path_prefix: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Update user request (admin, partial)
///
/// An empty `allowed_path_prefix` clears the restriction.
#[derive(Deserialize, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
    pub allowed_path_prefix: Option<String>,
}

/// User response (never carries the password hash)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub allowed_path_prefix: Option<String>,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            allowed_path_prefix: user.allowed_path_prefix,
            last_login_at: user.last_login_at.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Admin monitoring counters
#[derive(Serialize)]
pub struct UserStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
}

/// Named path prefix option for the admin panel
#[derive(Serialize)]
pub struct PathPrefixOption {
    pub value: String,
    pub label: String,
}

/// Query parameters for storage path discovery
#[derive(Deserialize, Default)]
pub struct DiscoverPathsQuery {
    #[serde(default)]
    pub prefix: String,
}

/// Storage folders discovered at a prefix, as restriction options
#[derive(Serialize)]
pub struct DiscoverPathsResponse {
    pub prefixes: Vec<PathPrefixOption>,
    pub prefix: Option<String>,
}

// ==================== File Types ====================

/// Flat file listing response
#[derive(Serialize)]
pub struct FileListResponse {
    pub files: Vec<ObjectInfo>,
    pub total: usize,
    pub prefix: Option<String>,
}

/// Tree listing response (folders + files)
#[derive(Serialize)]
pub struct FileTreeResponse {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<ObjectInfo>,
    pub prefix: Option<String>,
}

/// Listing query parameters
#[derive(Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_max_keys")]
    pub max_keys: usize,
}

fn default_max_keys() -> usize {
    1000
}

/// Upload query parameters
#[derive(Deserialize)]
pub struct UploadQuery {
    pub filename: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Upload response
#[derive(Serialize)]
pub struct FileUploadResponse {
    pub key: String,
    pub filename: String,
    pub size: usize,
}

/// Delete response
#[derive(Serialize)]
pub struct FileDeleteResponse {
    pub key: String,
    pub deleted: bool,
}

/// Create-folder request
#[derive(Deserialize)]
pub struct CreateFolderRequest {
    pub path: String,
}

/// Create-folder response
#[derive(Serialize)]
pub struct CreateFolderResponse {
    pub key: String,
}
