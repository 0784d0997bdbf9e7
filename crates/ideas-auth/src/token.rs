//! Signed session tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use ideas_model::{Role, User, UserId};

use crate::AuthError;

pub const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: UserId,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Issues and verifies tokens with one shared secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime: Duration::days(DEFAULT_TOKEN_LIFETIME_DAYS),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.encode(&Claims::for_user(user, self.lifetime))
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Check signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken(e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideas_model::NewUser;
    use uuid::Uuid;

    fn user(role: Role) -> User {
        User::new(
            Uuid::new_v4(),
            NewUser {
                name: "Kiran".to_string(),
                email: "kiran@example.com".to_string(),
                password_hash: "unused".to_string(),
                role,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = TokenIssuer::new(b"test-secret");
        let admin = user(Role::Admin);
        let token = issuer.issue(&admin).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.email, "kiran@example.com");
        assert!(claims.is_admin());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = TokenIssuer::new(b"one").issue(&user(Role::User)).unwrap();
        let err = TokenIssuer::new(b"two").verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_swapped_payload_is_rejected() {
        let issuer = TokenIssuer::new(b"secret");
        let mine = issuer.issue(&user(Role::User)).unwrap();
        let theirs = issuer.issue(&user(Role::Admin)).unwrap();

        let mine: Vec<&str> = mine.split('.').collect();
        let theirs: Vec<&str> = theirs.split('.').collect();
        let forged = format!("{}.{}.{}", mine[0], theirs[1], mine[2]);
        assert!(issuer.verify(&forged).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new(b"secret").with_lifetime(Duration::hours(-2));
        let token = issuer.issue(&user(Role::User)).unwrap();
        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
