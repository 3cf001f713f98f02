//! Contracts for creating, editing and deleting projects

use sf_core::error::ValidationErrors;
use sf_models::{permissions, Project};
use validator::Validate;

use crate::base::{merge_model_errors, require_permission, Contract, UserContext, ValidationResult};

/// Field rules shared by create and update
pub struct ProjectBaseContract;

impl ProjectBaseContract {
    pub fn validate_name(name: &str, errors: &mut ValidationErrors) {
        if name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
    }

    pub fn validate_amounts(project: &Project, errors: &mut ValidationErrors) {
        if project.estimated_value.is_some_and(|v| v < 0.0) {
            errors.add("estimated_value", "must not be negative");
        }
        if project.contract_value.is_some_and(|v| v < 0.0) {
            errors.add("contract_value", "must not be negative");
        }
    }

    pub fn validate_fields(project: &Project, errors: &mut ValidationErrors) {
        Self::validate_name(&project.name, errors);
        if let Err(model_errors) = project.validate() {
            merge_model_errors(model_errors, errors);
        }
        Self::validate_amounts(project, errors);
    }
}

/// Contract for creating a new project
pub struct CreateProjectContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> CreateProjectContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, U: UserContext> Contract<Project> for CreateProjectContract<'a, U> {
    fn validate(&self, project: &Project) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::ADD_PROJECTS, "create projects", &mut errors);
        ProjectBaseContract::validate_fields(project, &mut errors);
        errors.into_result()
    }
}

/// Contract for editing project attributes.
///
/// The stage only changes through moves and the Won/Lost actions.
pub struct UpdateProjectContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> UpdateProjectContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, U: UserContext> Contract<Project> for UpdateProjectContract<'a, U> {
    fn validate(&self, project: &Project) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::EDIT_PROJECTS, "edit projects", &mut errors);
        ProjectBaseContract::validate_fields(project, &mut errors);
        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "name"
                | "customer_name"
                | "customer_id"
                | "estimated_value"
                | "contract_value"
                | "lead_score"
                | "priority"
                | "expected_close_date"
                | "sales_owner_id"
        )
    }
}

pub struct DeleteProjectContract<'a, U: UserContext> {
    user: &'a U,
}

impl<'a, U: UserContext> DeleteProjectContract<'a, U> {
    pub fn new(user: &'a U) -> Self {
        Self { user }
    }
}

impl<'a, U: UserContext> Contract<Project> for DeleteProjectContract<'a, U> {
    fn validate(&self, _project: &Project) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::DELETE_PROJECTS, "delete projects", &mut errors);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ChangeTracker;
    use sf_core::error::FailureKind;
    use sf_core::traits::Id;
    use sf_models::{PipelineStage, Role};

    struct MockUser {
        roles: Vec<Role>,
    }

    impl UserContext for MockUser {
        fn id(&self) -> Id {
            5
        }
        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    fn sales() -> MockUser {
        MockUser {
            roles: vec![Role::Sales],
        }
    }

    #[test]
    fn test_sales_can_create() {
        let user = sales();
        let project = Project::new("Fleet tracking", "Transwest", 5, PipelineStage::Prospect);
        assert!(CreateProjectContract::new(&user).validate(&project).is_ok());
    }

    #[test]
    fn test_engineering_cannot_create() {
        let user = MockUser {
            roles: vec![Role::Engineering],
        };
        let project = Project::new("Fleet tracking", "Transwest", 5, PipelineStage::Prospect);
        let errors = CreateProjectContract::new(&user).validate(&project).unwrap_err();
        assert_eq!(errors.kind, FailureKind::Forbidden);
    }

    #[test]
    fn test_blank_name_and_bad_score() {
        let user = sales();
        let mut project = Project::new("   ", "Transwest", 5, PipelineStage::Prospect);
        project.lead_score = 140;
        project.estimated_value = Some(-5.0);
        let errors = CreateProjectContract::new(&user).validate(&project).unwrap_err();
        assert!(errors.has_error("name"));
        assert!(errors.has_error("lead_score"));
        assert!(errors.has_error("estimated_value"));
        assert_eq!(errors.kind, FailureKind::Invalid);
    }

    #[test]
    fn test_stage_is_not_writable_on_update() {
        let user = sales();
        let contract = UpdateProjectContract::new(&user);
        let mut tracker = ChangeTracker::new();
        tracker.mark_changed("stage");
        tracker.mark_changed("priority");

        let mut errors = ValidationErrors::new();
        tracker.validate_writable::<Project, _>(&contract, &mut errors);
        assert!(errors.has_error("stage"));
        assert!(!errors.has_error("priority"));
    }

    #[test]
    fn test_only_managers_delete() {
        let project = Project::new("Fleet tracking", "Transwest", 5, PipelineStage::Prospect);
        assert!(DeleteProjectContract::new(&sales()).validate(&project).is_err());

        let manager = MockUser {
            roles: vec![Role::SalesManager],
        };
        assert!(DeleteProjectContract::new(&manager).validate(&project).is_ok());
    }
}
