//! Won/Lost contracts
//!
//! Both terminal actions are only offered on a project whose proposal has
//! been delivered.

use serde::Serialize;
use sf_core::error::ValidationErrors;
use sf_models::{permissions, PipelineStage, Project, SalesOrder};

use crate::base::{require_permission, Contract, UserContext, ValidationResult};

/// Terminal actions a user may take on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectAction {
    MarkWon,
    MarkLost,
}

pub fn available_actions<U: UserContext + ?Sized>(user: &U, project: &Project) -> Vec<ProjectAction> {
    if project.stage != PipelineStage::ProposalDelivered {
        return Vec::new();
    }
    let mut actions = Vec::new();
    if user.allowed(permissions::CREATE_SALES_ORDERS) {
        actions.push(ProjectAction::MarkWon);
    }
    if user.allowed(permissions::MARK_LOST) {
        actions.push(ProjectAction::MarkLost);
    }
    actions
}

fn require_proposal_delivered(project: &Project, errors: &mut ValidationErrors) {
    if project.stage != PipelineStage::ProposalDelivered {
        errors.reject(format!(
            "Only projects in Proposal Delivered can be closed (project is in {})",
            project.stage.label()
        ));
    }
}

/// Contract for the sales order that marks a project Won
pub struct CreateSalesOrderContract<'a, U: UserContext> {
    user: &'a U,
    project: &'a Project,
}

impl<'a, U: UserContext> CreateSalesOrderContract<'a, U> {
    pub fn new(user: &'a U, project: &'a Project) -> Self {
        Self { user, project }
    }
}

impl<'a, U: UserContext> Contract<SalesOrder> for CreateSalesOrderContract<'a, U> {
    fn validate(&self, order: &SalesOrder) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::CREATE_SALES_ORDERS, "create sales orders", &mut errors);
        require_proposal_delivered(self.project, &mut errors);

        let po = order.customer_po_number.trim();
        if po.is_empty() {
            errors.add("customer_po_number", "can't be blank");
        } else if po.len() > 100 {
            errors.add("customer_po_number", "is too long (maximum is 100 characters)");
        }
        if order.document_ref.trim().is_empty() {
            errors.add("document_ref", "is required");
        }
        if !order.payment_terms.is_valid() {
            errors.add("payment_terms", "custom terms must be between 1 and 365 days");
        }
        if !(order.contract_value.is_finite() && order.contract_value >= 0.0) {
            errors.add("contract_value", "must not be negative");
        }

        errors.into_result()
    }
}

/// A Lost request with its free-text reason
#[derive(Debug, Clone, Copy)]
pub struct LostRequest<'p> {
    pub project: &'p Project,
    pub reason: &'p str,
}

pub struct MarkLostContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> MarkLostContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, 'p, U: UserContext> Contract<LostRequest<'p>> for MarkLostContract<'a, U> {
    fn validate(&self, request: &LostRequest<'p>) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::MARK_LOST, "mark projects as lost", &mut errors);
        require_proposal_delivered(request.project, &mut errors);
        if request.reason.trim().is_empty() {
            errors.add("reason", "can't be blank");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sf_core::error::FailureKind;
    use sf_core::traits::Id;
    use sf_models::{PaymentTerms, Role};

    struct MockUser {
        roles: Vec<Role>,
    }

    impl UserContext for MockUser {
        fn id(&self) -> Id {
            6
        }
        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    fn project(stage: PipelineStage) -> Project {
        let mut project = Project::new("Data center cooling", "Hostwerk", 6, stage);
        project.id = Some(8);
        project
    }

    fn order() -> SalesOrder {
        SalesOrder {
            id: None,
            order_number: String::new(),
            project_id: 8,
            customer_po_number: "PO-4471".into(),
            order_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            payment_terms: PaymentTerms::Net30,
            contract_value: 48_000.0,
            document_ref: "uploads/po-4471.pdf".into(),
            created_by: 6,
            created_at: None,
        }
    }

    #[test]
    fn test_actions_only_after_proposal() {
        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        for stage in PipelineStage::ALL {
            let actions = available_actions(&sales, &project(stage));
            if stage == PipelineStage::ProposalDelivered {
                assert_eq!(actions, vec![ProjectAction::MarkWon, ProjectAction::MarkLost]);
            } else {
                assert!(actions.is_empty(), "{stage}");
            }
        }

        let finance = MockUser {
            roles: vec![Role::Finance],
        };
        assert!(available_actions(&finance, &project(PipelineStage::ProposalDelivered)).is_empty());
    }

    #[test]
    fn test_sales_order_requirements() {
        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        let delivered = project(PipelineStage::ProposalDelivered);
        let contract = CreateSalesOrderContract::new(&sales, &delivered);
        assert!(contract.validate(&order()).is_ok());

        let mut bad = order();
        bad.customer_po_number = " ".into();
        bad.document_ref = String::new();
        bad.payment_terms = PaymentTerms::Custom { days: 400 };
        let errors = contract.validate(&bad).unwrap_err();
        assert!(errors.has_error("customer_po_number"));
        assert!(errors.has_error("document_ref"));
        assert!(errors.has_error("payment_terms"));
    }

    #[test]
    fn test_sales_order_needs_delivered_proposal() {
        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        let presales = project(PipelineStage::PreSales);
        let errors = CreateSalesOrderContract::new(&sales, &presales)
            .validate(&order())
            .unwrap_err();
        assert_eq!(errors.kind, FailureKind::BusinessRule);
    }

    #[test]
    fn test_lost_requires_reason() {
        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        let delivered = project(PipelineStage::ProposalDelivered);
        let contract = MarkLostContract::new(&sales);
        let errors = contract
            .validate(&LostRequest {
                project: &delivered,
                reason: "   ",
            })
            .unwrap_err();
        assert!(errors.has_error("reason"));

        assert!(contract
            .validate(&LostRequest {
                project: &delivered,
                reason: "Chose a competitor",
            })
            .is_ok());
    }
}
