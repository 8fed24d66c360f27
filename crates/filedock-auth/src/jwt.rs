//! JWT token management

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use filedock_db::User;

/// Type discriminator carried by refresh tokens
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims
///
/// `sub` is always the string form of the numeric user id, so a claim
/// set survives re-serialization without the subject changing type.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID, stringified)
    pub sub: String,
    /// Email address
    pub email: String,
    /// User role
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: absent on access tokens, "refresh" on refresh tokens
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Unique token id. Refresh tokens carry one so that two tokens
    /// minted for the same user within the same second still differ.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// JWT manager for token generation and validation
///
/// The codec itself is type-agnostic: it signs and verifies either
/// token kind, and callers must check `Claims::token_type` before
/// trusting a token for refresh purposes.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_minutes: i64,
    refresh_ttl_days: i64,
}

impl JwtManager {
    /// Create a new JWT manager (HS256 with a shared secret)
    pub fn new(secret: &str, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_minutes,
            refresh_ttl_days,
        }
    }

    /// How long a refresh token (and its session row) lives
    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }

    /// Generate a short-lived access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_ttl_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: None,
            jti: None,
        };

        debug!("Generating access token for user: {}", user.email);

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + self.refresh_ttl();

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: Some(TOKEN_TYPE_REFRESH.to_string()),
            jti: Some(Uuid::new_v4().to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a token's signature and expiry and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        // Check expiration
        let now = Utc::now().timestamp();
        if token_data.claims.exp < now {
            return Err(AuthError::Unauthenticated);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use filedock_db::UserRole;

    fn test_user() -> User {
        User {
            id: 7,
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            role: UserRole::Viewer,
            is_active: true,
            allowed_path_prefix: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manager() -> JwtManager {
        JwtManager::new("test-secret-key", 30, 7)
    }

    #[test]
    fn test_access_token_round_trip() {
        let jwt = manager();
        let token = jwt.generate_access_token(&test_user()).unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "viewer");
        assert_eq!(claims.token_type, None);
    }

    #[test]
    fn test_refresh_token_carries_type_discriminator() {
        let jwt = manager();
        let token = jwt.generate_refresh_token(&test_user()).unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.token_type.as_deref(), Some(TOKEN_TYPE_REFRESH));
        assert!(claims.jti.is_some());
    }

    #[test]
    fn test_refresh_tokens_are_unique_per_issue() {
        let jwt = manager();
        let user = test_user();
        let a = jwt.generate_refresh_token(&user).unwrap();
        let b = jwt.generate_refresh_token(&user).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_token() {
        let jwt = manager();
        assert!(jwt.validate_token("invalid-token").is_err());
    }

    #[test]
    fn test_tampered_token_is_invalid_everywhere() {
        let jwt = manager();
        let token = jwt.generate_access_token(&test_user()).unwrap();

        // Flipping any single byte must fail verification, never panic
        let bytes = token.as_bytes();
        for i in 0..bytes.len() {
            let mut tampered = bytes.to_vec();
            tampered[i] ^= 0x01;
            if let Ok(s) = String::from_utf8(tampered) {
                if s == token {
                    continue;
                }
                assert!(jwt.validate_token(&s).is_err(), "byte {} accepted", i);
            }
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = manager().generate_access_token(&test_user()).unwrap();
        let other = JwtManager::new("different-secret", 30, 7);
        assert!(other.validate_token(&token).is_err());
    }
}
