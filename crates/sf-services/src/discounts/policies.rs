//! Discount policies

use sf_contracts::base::{require_permission, Contract, UserContext};
use sf_contracts::discounts::UpsertPolicyContract;
use sf_core::error::ValidationErrors;
use sf_models::{permissions, DiscountPolicy, Role};

use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// The most permissive policy over the user's roles.
///
/// Falls back to the configured default limits when none of the roles has a
/// stored policy.
pub async fn effective_policy<U: UserContext + ?Sized>(
    ctx: &ServiceContext,
    user: &U,
) -> Result<DiscountPolicy, ValidationErrors> {
    let mut found = Vec::new();
    for role in user.roles() {
        if let Some(policy) = ctx.stores.policies.find_by_role(*role).await? {
            found.push(policy);
        }
    }

    Ok(DiscountPolicy::most_permissive(&found).unwrap_or_else(|| {
        let role = user.roles().first().copied().unwrap_or(Role::Sales);
        DiscountPolicy::new(
            role,
            ctx.discount_defaults.default_authority_limit,
            ctx.discount_defaults.default_max_limit,
        )
    }))
}

pub struct PolicyService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> PolicyService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn list(&self) -> ServiceResult<Vec<DiscountPolicy>> {
        self.load_all().await.into()
    }

    /// Create or replace the policy for `role`
    pub async fn upsert(&self, role: Role, authority_limit: f64, max_limit: f64) -> ServiceResult<DiscountPolicy> {
        let user_id = self.user.id();
        ServiceResult::from(self.store(DiscountPolicy::new(role, authority_limit, max_limit)).await)
            .on_success(|policy| {
                tracing::info!(
                    role = %policy.role,
                    authority_limit = policy.authority_limit,
                    max_limit = policy.max_limit,
                    user_id,
                    "discount policy saved"
                );
            })
            .on_failure(|errors| log_rejection("upsert_policy", user_id, errors))
    }

    /// The policy that applies to the acting user
    pub async fn mine(&self) -> ServiceResult<DiscountPolicy> {
        effective_policy(self.ctx, self.user).await.into()
    }

    async fn load_all(&self) -> Result<Vec<DiscountPolicy>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::VIEW_PIPELINE, "view discount policies", &mut errors);
        errors.into_result()?;
        Ok(self.ctx.stores.policies.find_all().await?)
    }

    async fn store(&self, policy: DiscountPolicy) -> Result<DiscountPolicy, ValidationErrors> {
        UpsertPolicyContract::new(self.user).validate(&policy)?;
        Ok(self.ctx.stores.policies.upsert(policy).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use sf_core::error::FailureKind;

    #[tokio::test]
    async fn test_default_policy_without_stored_ones() {
        let ctx = ServiceContext::in_memory().with_discount_defaults(5.0, 25.0);
        let user = MockUser::sales();

        let policy = effective_policy(&ctx, &user).await.unwrap();
        assert_eq!(policy.role, Role::Sales);
        assert_eq!(policy.authority_limit, 5.0);
        assert_eq!(policy.max_limit, 25.0);
    }

    #[tokio::test]
    async fn test_most_permissive_over_roles() {
        let ctx = ServiceContext::in_memory();
        let ceo = MockUser::ceo();
        let service = PolicyService::new(&ctx, &ceo);
        service.upsert(Role::Sales, 10.0, 20.0).await.into_result().unwrap();
        service.upsert(Role::SalesManager, 15.0, 18.0).await.into_result().unwrap();

        let user = MockUser {
            id: 7,
            roles: vec![Role::Sales, Role::SalesManager],
        };
        let policy = effective_policy(&ctx, &user).await.unwrap();
        assert_eq!(policy.authority_limit, 15.0);
        assert_eq!(policy.max_limit, 20.0);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let ctx = ServiceContext::in_memory();
        let ceo = MockUser::ceo();
        let service = PolicyService::new(&ctx, &ceo);
        service.upsert(Role::Sales, 10.0, 20.0).await;
        service.upsert(Role::Sales, 12.0, 30.0).await;

        let policies = service.list().await.into_result().unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].max_limit, 30.0);
    }

    #[tokio::test]
    async fn test_upsert_validates_limits() {
        let ctx = ServiceContext::in_memory();
        let ceo = MockUser::ceo();

        let result = PolicyService::new(&ctx, &ceo).upsert(Role::Sales, 40.0, 20.0).await;
        assert!(result.errors().has_error("authority_limit"));
    }

    #[tokio::test]
    async fn test_sales_cannot_manage_policies() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::sales();

        let result = PolicyService::new(&ctx, &user).upsert(Role::Sales, 50.0, 60.0).await;
        assert_eq!(result.errors().kind, FailureKind::Forbidden);
    }
}
