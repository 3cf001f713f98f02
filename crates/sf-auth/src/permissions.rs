//! The authenticated caller

use sf_contracts::base::UserContext;
use sf_core::traits::Id;
use sf_models::{Role, UserAccount};

use crate::jwt::{Claims, JwtError};

/// Current user with the roles carried by their token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Id,
    pub login: String,
    roles: Vec<Role>,
}

impl CurrentUser {
    pub fn new(id: Id, login: impl Into<String>, roles: Vec<Role>) -> Self {
        let mut roles = roles;
        roles.sort();
        roles.dedup();
        Self {
            id,
            login: login.into(),
            roles,
        }
    }

    /// Rebuild the caller from validated claims
    pub fn from_claims(claims: &Claims) -> Result<Self, JwtError> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::Invalid("Invalid user ID in token".to_string()))?;
        let roles = claims
            .roles
            .iter()
            .map(|name| {
                name.parse::<Role>()
                    .map_err(|e| JwtError::Invalid(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(id, claims.login.clone(), roles))
    }

    /// Union of the permissions of all roles
    pub fn permissions(&self) -> Vec<&'static str> {
        let mut permissions: Vec<&'static str> = self
            .roles
            .iter()
            .flat_map(|role| role.permissions().iter().copied())
            .collect();
        permissions.sort_unstable();
        permissions.dedup();
        permissions
    }
}

impl From<&UserAccount> for CurrentUser {
    fn from(account: &UserAccount) -> Self {
        Self::new(
            account.id.unwrap_or_default(),
            account.login.clone(),
            account.roles.clone(),
        )
    }
}

impl UserContext for CurrentUser {
    fn id(&self) -> Id {
        self.id
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }
}
