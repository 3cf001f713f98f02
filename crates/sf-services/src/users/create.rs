//! Create Service for Users

use serde::Deserialize;
use sf_auth::hash_password;
use sf_contracts::base::{Contract, UserContext};
use sf_contracts::users::{CreateUserContract, NewUser};
use sf_core::error::{FailureKind, ValidationErrors};
use sf_models::{Role, UserAccount};

use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserParams {
    pub login: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

pub struct CreateUserService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> CreateUserService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, params: NewUserParams) -> ServiceResult<UserAccount> {
        let user_id = self.user.id();
        ServiceResult::from(self.create(params).await)
            .on_success(|account| tracing::info!(new_user_id = account.id, login = %account.login, user_id, "user created"))
            .on_failure(|errors| log_rejection("create_user", user_id, errors))
    }

    async fn create(&self, params: NewUserParams) -> Result<UserAccount, ValidationErrors> {
        let mut account = UserAccount::new(params.login.trim(), params.email.trim(), params.roles);
        account.name = params.name.trim().to_string();

        CreateUserContract::new(self.user, self.ctx.password_min_length).validate(&NewUser {
            account: &account,
            password: &params.password,
        })?;

        account.password_hash = hash_password(&params.password).map_err(|err| {
            tracing::error!(error = %err, "failed to hash password");
            ValidationErrors::of_kind(FailureKind::Internal, "Password could not be stored")
        })?;

        Ok(self.ctx.stores.users.create(account).await?)
    }
}
