//! User account model
//!
//! Table: users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sf_core::traits::{Entity, Id, Identifiable, Timestamped};
use validator::Validate;

use crate::role::Role;

/// A person who signs in and acts on the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: Option<Id>,

    /// Login name (unique)
    #[validate(length(min = 1, max = 255))]
    pub login: String,

    #[validate(email)]
    pub email: String,

    /// Display name
    #[validate(length(max = 255))]
    #[serde(default)]
    pub name: String,

    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default = "default_true")]
    pub active: bool,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl UserAccount {
    pub fn new(login: impl Into<String>, email: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: None,
            login: login.into(),
            email: email.into(),
            name: String::new(),
            password_hash: String::new(),
            roles,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
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

impl Identifiable for UserAccount {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for UserAccount {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for UserAccount {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}
