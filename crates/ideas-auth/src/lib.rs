//! Authentication and authorization for 10000Ideas
//!
//! - [`password`]: salted Argon2id hashing behind the [`PasswordHasher`] trait,
//! - [`token`]: HS256 session tokens carrying the user id, e-mail and role,
//! - [`guard`]: bearer-header parsing and role/ownership checks.
//!
//! Nothing in here touches the store. Callers look users up, then hand the
//! stored hash or the decoded [`Claims`] to these functions.

pub mod guard;
pub mod password;
pub mod token;

pub use guard::{bearer_token, ensure_admin, ensure_owner_or_admin};
pub use password::{check_password_strength, Argon2Hasher, PasswordHasher, MIN_PASSWORD_LEN};
pub use token::{Claims, TokenIssuer, DEFAULT_TOKEN_LIFETIME_DAYS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),
}
