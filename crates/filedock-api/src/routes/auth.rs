//! Authentication extractors and session lifecycle routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use tracing::debug;

use filedock_auth::{AuthError, Identity, hash_password};
use filedock_db::{NewUser, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    LoginRequest, LogoutResponse, RefreshTokenRequest, SignupRequest, TokenResponse, UserResponse,
};

// ==================== Auth Extractors ====================

/// Extractor for an authenticated caller (required)
pub struct RequireAuth(pub Identity);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Unauthenticated)?;

        let identity = app_state.guard.authenticate(token).await?;
        debug!(
            "Authenticated user: {} ({})",
            identity.email,
            identity.role.as_str()
        );
        Ok(RequireAuth(identity))
    }
}

/// Extractor for an admin caller (required)
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;
        identity.require_role(&[UserRole::Admin])?;
        Ok(RequireAdmin(identity))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed email length
pub(crate) const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
pub(crate) const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
pub(crate) const MIN_PASSWORD_LENGTH: usize = 8;

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email cannot be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_email(&request.email)?;
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    let pair = state.sessions.login(&request.email, &request.password).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer",
    }))
}

/// POST /api/v1/auth/refresh
async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state.sessions.refresh(&request.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer",
    }))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<LogoutResponse>, ApiError> {
    let logged_out = state.sessions.logout(&request.refresh_token).await?;
    Ok(Json(LogoutResponse { logged_out }))
}

/// GET /api/v1/auth/me
async fn me(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(identity.id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;
    Ok(Json(user.into()))
}

/// POST /api/v1/auth/signup
///
/// Public signup. The role is always viewer; it is never taken from
/// the request.
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&request.email)?;
    validate_new_password(&request.password)?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .db
        .insert_user(NewUser {
            email: request.email,
            password_hash,
            full_name: request.full_name,
            role: UserRole::Viewer,
            is_active: true,
            allowed_path_prefix: None,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/signup", post(signup))
}
