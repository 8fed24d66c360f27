//! Authentication error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No identity: missing, malformed, or expired access token
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid identity, insufficient role/permission or out-of-scope path
    #[error("Permission denied")]
    Forbidden,

    /// Login failure. Unknown email, wrong password and inactive account
    /// all collapse here so callers cannot enumerate accounts.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Refresh failure. Malformed, wrong-type, unknown and expired
    /// tokens are indistinguishable to the caller.
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Db(#[from] filedock_db::DbError),
}
