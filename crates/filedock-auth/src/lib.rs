//! Filedock Authentication and Authorization
//!
//! This crate provides JWT-based authentication, role-based access
//! control, path-prefix scoping over the storage namespace, and the
//! refresh-token session lifecycle for Filedock.

pub mod error;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod scope;
pub mod session;

pub use error::AuthError;
pub use guard::{AuthGuard, Identity};
pub use jwt::{Claims, JwtManager, TOKEN_TYPE_REFRESH};
pub use password::{hash_password, verify_password};
pub use permissions::{AccessRule, Permission, access_rules, has_permission};
pub use scope::{can_access_key, effective_list_prefix};
pub use session::{SessionManager, TokenPair};
