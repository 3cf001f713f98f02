//! Request authentication
//!
//! Turns an `Authorization` header into a [`CurrentUser`]. The HTTP layer
//! decides what a failure looks like on the wire.

use std::sync::Arc;
use thiserror::Error;

use crate::jwt::{extract_bearer_token, JwtError, JwtService};
use crate::permissions::CurrentUser;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Required,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::Missing => AuthError::Required,
            JwtError::Invalid(reason) => {
                tracing::debug!(%reason, "rejected bearer token");
                AuthError::InvalidToken
            }
            JwtError::EncodingFailed(reason) => AuthError::Internal(reason),
        }
    }
}

/// Bearer-token authenticator shared by all requests
#[derive(Clone)]
pub struct Authenticator {
    jwt: Arc<JwtService>,
}

impl Authenticator {
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Authenticate from the raw `Authorization` header value
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<CurrentUser, AuthError> {
        let header = authorization.ok_or(AuthError::Required)?;
        let token = extract_bearer_token(header).ok_or(AuthError::Required)?;
        let claims = self.jwt.validate_token(token)?;
        Ok(CurrentUser::from_claims(&claims)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_contracts::base::UserContext;
    use sf_models::Role;

    fn authenticator() -> Authenticator {
        Authenticator::new(Arc::new(JwtService::new(
            b"test-secret-key-at-least-32-bytes",
            3600,
        )))
    }

    #[test]
    fn test_authenticate_bearer() {
        let auth = authenticator();
        let token = auth
            .jwt()
            .create_token_for(3, "sales1", vec!["SALES".into()])
            .unwrap();
        let user = auth
            .authenticate(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(user.id, 3);
        assert!(user.has_role(Role::Sales));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            authenticator().authenticate(None),
            Err(AuthError::Required)
        ));
        assert!(matches!(
            authenticator().authenticate(Some("Basic Zm9vOmJhcg==")),
            Err(AuthError::Required)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            authenticator().authenticate(Some("Bearer not.a.jwt")),
            Err(AuthError::InvalidToken)
        ));
    }
}
