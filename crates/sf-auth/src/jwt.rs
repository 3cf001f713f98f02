//! JWT Authentication

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sf_core::traits::Id;
use sf_models::UserAccount;
use thiserror::Error;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub login: String,
    /// Role wire names, e.g. `SALES`
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token is expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Missing token")]
    Missing,
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

/// JWT service for creating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_seconds: u64,
    issuer: Option<String>,
}

impl JwtService {
    /// Create a new JWT service with the given secret
    pub fn new(secret: &[u8], expires_in_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expires_in_seconds,
            issuer: None,
        }
    }

    /// Set the issuer claim for validation
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn expires_in_seconds(&self) -> u64 {
        self.expires_in_seconds
    }

    /// Issue a token for a signed-in account
    pub fn create_token(&self, user: &UserAccount) -> Result<String, JwtError> {
        let user_id = user
            .id
            .ok_or_else(|| JwtError::EncodingFailed("account has no id".to_string()))?;
        let roles = user.roles.iter().map(|role| role.as_str().to_string()).collect();
        self.create_token_for(user_id, &user.login, roles)
    }

    pub fn create_token_for(
        &self,
        user_id: Id,
        login: &str,
        roles: Vec<String>,
    ) -> Result<String, JwtError> {
        let now = chrono::Utc::now().timestamp().max(0) as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.expires_in_seconds as usize,
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            login: login.to_string(),
            roles,
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer.clone()]);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Extract user ID from a validated token
    pub fn get_user_id(&self, token: &str) -> Result<Id, JwtError> {
        let claims = self.validate_token(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| JwtError::Invalid("Invalid user ID in token".to_string()))
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    let scheme = authorization.get(..7)?;
    if scheme.eq_ignore_ascii_case("bearer ") {
        let token = authorization[7..].trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_models::Role;

    fn account() -> UserAccount {
        let mut user = UserAccount::new("m.keller", "m.keller@example.com", vec![Role::Sales, Role::Ceo]);
        user.id = Some(7);
        user
    }

    #[test]
    fn test_create_and_validate_token() {
        let service = JwtService::new(b"test-secret-key-at-least-32-bytes", 3600);

        let token = service.create_token(&account()).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.login, "m.keller");
        assert_eq!(claims.roles, vec!["SALES", "CEO"]);
        assert!(claims.jti.is_some());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer = JwtService::new(b"test-secret-key-at-least-32-bytes", 3600);
        let other = JwtService::new(b"another-secret-key-of-32-bytes!!", 3600);
        let token = issuer.create_token(&account()).unwrap();
        assert!(matches!(other.validate_token(&token), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_issuer_must_match() {
        let service = JwtService::new(b"test-secret-key-at-least-32-bytes", 3600)
            .with_issuer("salesflow");
        let token = service.create_token(&account()).unwrap();
        assert!(service.validate_token(&token).is_ok());

        let strict = JwtService::new(b"test-secret-key-at-least-32-bytes", 3600)
            .with_issuer("someone-else");
        assert!(strict.validate_token(&token).is_err());
    }

    #[test]
    fn test_account_without_id() {
        let service = JwtService::new(b"test-secret-key-at-least-32-bytes", 3600);
        let mut user = account();
        user.id = None;
        assert!(matches!(
            service.create_token(&user),
            Err(JwtError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Bear"), None);
    }

    #[test]
    fn test_get_user_id() {
        let service = JwtService::new(b"test-secret-key-at-least-32-bytes", 3600);
        let token = service.create_token_for(42, "ops", vec![]).unwrap();
        assert_eq!(service.get_user_id(&token).unwrap(), 42);
    }
}
