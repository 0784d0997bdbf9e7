//! Request-level checks.

use ideas_model::UserId;

use crate::token::Claims;
use crate::AuthError;

/// Token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

pub fn ensure_admin(claims: &Claims) -> Result<(), AuthError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden("admin role required"))
    }
}

pub fn ensure_owner_or_admin(claims: &Claims, owner: UserId) -> Result<(), AuthError> {
    if claims.sub == owner || claims.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden("only the owner or an admin may do this"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideas_model::Role;
    use uuid::Uuid;

    fn claims(role: Role) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            role,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(Some("bearer   tok ")), Ok("tok"));
        assert_eq!(bearer_token(None), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("Basic dXNlcg==")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("Bearer")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_role_and_ownership_guards() {
        let user = claims(Role::User);
        let admin = claims(Role::Admin);

        assert!(ensure_admin(&admin).is_ok());
        assert!(matches!(ensure_admin(&user), Err(AuthError::Forbidden(_))));

        assert!(ensure_owner_or_admin(&user, user.sub).is_ok());
        assert!(ensure_owner_or_admin(&admin, user.sub).is_ok());
        assert!(ensure_owner_or_admin(&user, Uuid::new_v4()).is_err());
    }
}
