//! Update Service for Projects

use sf_contracts::base::{ChangeTracker, Contract, UserContext};
use sf_contracts::projects::UpdateProjectContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::{Journal, JournalAction};
use sf_models::Project;

use super::ProjectParams;
use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// Service for editing project attributes
pub struct UpdateProjectService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> UpdateProjectService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, id: Id, params: ProjectParams) -> ServiceResult<Project> {
        let user_id = self.user.id();
        ServiceResult::from(self.update(id, params).await)
            .on_success(|project| tracing::info!(project_id = project.id, user_id, "project updated"))
            .on_failure(|errors| log_rejection("update_project", user_id, errors))
    }

    async fn update(&self, id: Id, params: ProjectParams) -> Result<Project, ValidationErrors> {
        let mut project = self.ctx.find_project(id).await?;
        let contract = UpdateProjectContract::new(self.user);

        let mut changes = ChangeTracker::new();
        for attribute in params.apply(&mut project) {
            changes.mark_changed(attribute);
        }
        if params.stage.is_some() {
            changes.mark_changed("stage");
        }

        let mut errors = ValidationErrors::new();
        changes.validate_writable(&contract, &mut errors);
        if let Err(contract_errors) = contract.validate(&project) {
            errors.merge(contract_errors);
        }
        errors.into_result()?;

        if changes.changed_attributes().is_empty() {
            return Ok(project);
        }

        let project = self.ctx.stores.projects.update(project).await?;

        let mut changed: Vec<&str> = changes.changed_attributes().iter().map(String::as_str).collect();
        changed.sort_unstable();
        self.ctx
            .journal(
                Journal::project(id, JournalAction::Updated, self.user.id())
                    .with_notes(changed.join(", ")),
            )
            .await;
        Ok(project)
    }
}
