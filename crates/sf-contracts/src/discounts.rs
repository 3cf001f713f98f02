//! Discount request, decision and policy contracts

use sf_core::error::ValidationErrors;
use sf_core::types::is_valid_percent;
use sf_models::{permissions, DiscountClass, DiscountPolicy, Estimation, EstimationStatus};

use crate::base::{require_permission, Contract, UserContext, ValidationResult};

/// A discount percentage asked for on one estimation
#[derive(Debug, Clone, Copy)]
pub struct DiscountRequest<'e> {
    pub estimation: &'e Estimation,
    pub percent: f64,
}

/// Contract for Sales asking for a discount.
///
/// Checked against the requester's effective policy. The returned class
/// tells the service whether the request needs a CEO decision.
pub struct RequestDiscountContract<'a, U: UserContext> {
    user: &'a U,
    policy: &'a DiscountPolicy,
}

impl<'a, U: UserContext> RequestDiscountContract<'a, U> {
    pub fn new(user: &'a U, policy: &'a DiscountPolicy) -> Self {
        Self { user, policy }
    }

    pub fn check(&self, request: DiscountRequest<'_>) -> Result<DiscountClass, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::REQUEST_DISCOUNTS, "request discounts", &mut errors);

        if !is_valid_percent(request.percent) {
            errors.add("percent", "must be between 0 and 100");
        }

        match request.estimation.status {
            EstimationStatus::PendingDiscountApproval => {
                errors.conflict("A discount request is already pending for this estimation");
            }
            status if !status.accepts_discount_request() => {
                errors.reject(format!(
                    "Discounts can only be requested on approved estimations (status is {status})"
                ));
            }
            _ => {}
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let class = self.policy.classify(request.percent);
        if class == DiscountClass::ExceedsMax {
            errors.reject(format!(
                "Requested discount of {}% exceeds the maximum allowed {}%",
                request.percent, self.policy.max_limit
            ));
            return Err(errors);
        }
        Ok(class)
    }
}

impl<'a, 'e, U: UserContext> Contract<DiscountRequest<'e>> for RequestDiscountContract<'a, U> {
    fn validate(&self, request: &DiscountRequest<'e>) -> ValidationResult {
        self.check(*request).map(|_| ())
    }
}

/// Contract for the CEO decision on a pending request
pub struct DecideDiscountContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> DecideDiscountContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, U: UserContext> Contract<Estimation> for DecideDiscountContract<'a, U> {
    fn validate(&self, estimation: &Estimation) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::DECIDE_DISCOUNTS, "decide discounts", &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        if estimation.status != EstimationStatus::PendingDiscountApproval {
            errors.reject(format!(
                "No discount request is pending for this estimation (status is {})",
                estimation.status
            ));
        } else if estimation.requested_discount.is_none() {
            errors.reject("Pending request has no requested discount");
        }
        errors.into_result()
    }
}

pub struct UpsertPolicyContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> UpsertPolicyContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, U: UserContext> Contract<DiscountPolicy> for UpsertPolicyContract<'a, U> {
    fn validate(&self, policy: &DiscountPolicy) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::MANAGE_POLICIES, "manage discount policies", &mut errors);
        if let Err(policy_errors) = policy.validate() {
            errors.merge(policy_errors);
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::error::FailureKind;
    use sf_core::traits::Id;
    use sf_models::Role;

    struct MockUser {
        roles: Vec<Role>,
    }

    impl UserContext for MockUser {
        fn id(&self) -> Id {
            3
        }
        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    fn user(role: Role) -> MockUser {
        MockUser { roles: vec![role] }
    }

    fn estimation(status: EstimationStatus) -> Estimation {
        let mut estimation = Estimation::new(1, 1, "Brief", 3);
        estimation.id = Some(11);
        estimation.status = status;
        estimation
    }

    fn request(estimation: &Estimation, percent: f64) -> DiscountRequest<'_> {
        DiscountRequest { estimation, percent }
    }

    #[test]
    fn test_request_classes() {
        let sales = user(Role::Sales);
        let policy = DiscountPolicy::new(Role::Sales, 10.0, 20.0);
        let contract = RequestDiscountContract::new(&sales, &policy);
        let approved = estimation(EstimationStatus::Approved);

        assert_eq!(contract.check(request(&approved, 8.0)).unwrap(), DiscountClass::WithinAuthority);
        assert_eq!(contract.check(request(&approved, 15.0)).unwrap(), DiscountClass::NeedsApproval);

        let errors = contract.check(request(&approved, 25.0)).unwrap_err();
        assert_eq!(errors.kind, FailureKind::BusinessRule);
        assert_eq!(
            errors.first_message().as_deref(),
            Some("Requested discount of 25% exceeds the maximum allowed 20%")
        );
    }

    #[test]
    fn test_resubmission_after_rejection() {
        let sales = user(Role::Sales);
        let policy = DiscountPolicy::new(Role::Sales, 10.0, 20.0);
        let contract = RequestDiscountContract::new(&sales, &policy);
        let rejected = estimation(EstimationStatus::DiscountRejected);
        assert!(contract.validate(&request(&rejected, 12.0)).is_ok());
    }

    #[test]
    fn test_second_outstanding_request_conflicts() {
        let sales = user(Role::Sales);
        let policy = DiscountPolicy::new(Role::Sales, 10.0, 20.0);
        let contract = RequestDiscountContract::new(&sales, &policy);
        let pending = estimation(EstimationStatus::PendingDiscountApproval);
        let errors = contract.check(request(&pending, 12.0)).unwrap_err();
        assert_eq!(errors.kind, FailureKind::Conflict);

        let in_progress = estimation(EstimationStatus::InProgress);
        let errors = contract.check(request(&in_progress, 5.0)).unwrap_err();
        assert_eq!(errors.kind, FailureKind::BusinessRule);
    }

    #[test]
    fn test_percent_out_of_range() {
        let sales = user(Role::Sales);
        let policy = DiscountPolicy::new(Role::Sales, 10.0, 20.0);
        let approved = estimation(EstimationStatus::Approved);
        let errors = RequestDiscountContract::new(&sales, &policy)
            .check(request(&approved, 140.0))
            .unwrap_err();
        assert!(errors.has_error("percent"));
    }

    #[test]
    fn test_only_ceo_decides() {
        let mut pending = estimation(EstimationStatus::PendingDiscountApproval);
        pending.requested_discount = Some(15.0);

        let errors = DecideDiscountContract::new(&user(Role::Admin))
            .validate(&pending)
            .unwrap_err();
        assert_eq!(errors.kind, FailureKind::Forbidden);

        assert!(DecideDiscountContract::new(&user(Role::Ceo)).validate(&pending).is_ok());
        assert!(DecideDiscountContract::new(&user(Role::Ceo))
            .validate(&estimation(EstimationStatus::Approved))
            .is_err());
    }

    #[test]
    fn test_policy_upsert() {
        let ceo = user(Role::Ceo);
        assert!(UpsertPolicyContract::new(&ceo)
            .validate(&DiscountPolicy::new(Role::Sales, 10.0, 20.0))
            .is_ok());
        assert!(UpsertPolicyContract::new(&ceo)
            .validate(&DiscountPolicy::new(Role::Sales, 30.0, 20.0))
            .is_err());
        assert!(UpsertPolicyContract::new(&user(Role::Sales))
            .validate(&DiscountPolicy::new(Role::Sales, 10.0, 20.0))
            .is_err());
    }
}
