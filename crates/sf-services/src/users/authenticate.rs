//! Sign-in, the current user, and the bootstrap administrator

use sf_auth::{hash_password, verify_password};
use sf_core::error::{FailureKind, ValidationErrors};
use sf_core::traits::Id;
use sf_models::{Role, UserAccount};

use crate::base::{not_found, ServiceContext};
use crate::result::ServiceResult;

/// Check a login and password.
///
/// `None` for unknown logins, wrong passwords and inactive accounts alike.
pub async fn authenticate(
    ctx: &ServiceContext,
    login: &str,
    password: &str,
) -> Result<Option<UserAccount>, ValidationErrors> {
    let Some(user) = ctx.stores.users.find_by_login(login.trim()).await? else {
        tracing::debug!(login, "unknown login");
        return Ok(None);
    };
    if !user.active {
        tracing::debug!(login, "inactive account");
        return Ok(None);
    }
    if !verify_password(password, &user.password_hash) {
        tracing::debug!(login, "wrong password");
        return Ok(None);
    }
    Ok(Some(user))
}

/// Create the configured administrator unless the login already exists
pub async fn seed_admin(
    ctx: &ServiceContext,
    login: &str,
    password: &str,
) -> Result<Option<UserAccount>, ValidationErrors> {
    if ctx.stores.users.find_by_login(login).await?.is_some() {
        tracing::debug!(login, "bootstrap admin already present");
        return Ok(None);
    }

    let mut admin = UserAccount::new(login, format!("{login}@salesflow.local"), vec![Role::Admin]);
    admin.name = "Administrator".to_string();
    admin.password_hash = hash_password(password).map_err(|err| {
        tracing::error!(error = %err, "failed to hash bootstrap password");
        ValidationErrors::of_kind(FailureKind::Internal, "Password could not be stored")
    })?;

    let admin = ctx.stores.users.create(admin).await?;
    tracing::info!(user_id = admin.id, login, "bootstrap admin created");
    Ok(Some(admin))
}

pub struct UserQueries<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserQueries<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The signed-in user's stored account
    pub async fn me(&self, id: Id) -> ServiceResult<UserAccount> {
        self.load(id).await.into()
    }

    async fn load(&self, id: Id) -> Result<UserAccount, ValidationErrors> {
        self.ctx
            .stores
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("User", id))
    }
}
