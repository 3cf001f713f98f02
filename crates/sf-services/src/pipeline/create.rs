//! Create Service for Projects

use sf_contracts::base::{Contract, UserContext};
use sf_contracts::projects::CreateProjectContract;
use sf_core::error::ValidationErrors;
use sf_journals::{Journal, JournalAction};
use sf_models::Project;

use super::ProjectParams;
use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// Service for creating projects
///
/// New projects start in the first board stage and belong to the creator
/// unless another sales owner is given.
///
/// # Example
/// ```ignore
/// let params = ProjectParams::new()
///     .with_name("Plant automation")
///     .with_customer_name("Hansa Chemie");
/// let result = CreateProjectService::new(&ctx, &user).call(params).await;
/// ```
pub struct CreateProjectService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> CreateProjectService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, params: ProjectParams) -> ServiceResult<Project> {
        let user_id = self.user.id();
        ServiceResult::from(self.create(params).await)
            .on_success(|project| {
                tracing::info!(
                    project_id = project.id,
                    stage = %project.stage,
                    user_id,
                    "project created"
                );
            })
            .on_failure(|errors| log_rejection("create_project", user_id, errors))
    }

    async fn create(&self, params: ProjectParams) -> Result<Project, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if params.stage.is_some() {
            errors.add("stage", "is not writable");
        }

        let mut project = Project::new(
            String::new(),
            String::new(),
            self.user.id(),
            self.ctx.board.first_stage(),
        );
        params.apply(&mut project);

        if let Err(contract_errors) = CreateProjectContract::new(self.user).validate(&project) {
            errors.merge(contract_errors);
        }
        errors.into_result()?;

        let project = self.ctx.stores.projects.create(project).await?;
        if let Some(id) = project.id {
            self.ctx
                .journal(
                    Journal::project(id, JournalAction::Created, self.user.id())
                        .resulting_in(project.stage),
                )
                .await;
        }
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUser;
    use sf_core::error::FailureKind;
    use sf_models::{Board, PipelineStage};

    fn params() -> ProjectParams {
        ProjectParams::new()
            .with_name("Warehouse sensors")
            .with_customer_name("Nordlicht Logistik")
            .with_estimated_value(18_000.0)
    }

    #[tokio::test]
    async fn test_create_starts_in_first_stage() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::sales();

        let result = CreateProjectService::new(&ctx, &user).call(params()).await;

        assert!(result.is_success(), "{:?}", result.errors().full_messages());
        let project = result.result().unwrap();
        assert_eq!(project.stage, PipelineStage::Prospect);
        assert_eq!(project.sales_owner_id, user.id);
        assert!(project.id.is_some());
    }

    #[tokio::test]
    async fn test_create_uses_configured_first_stage() {
        let board = Board::new(vec![PipelineStage::MeetingScheduled, PipelineStage::Won]).unwrap();
        let ctx = ServiceContext::in_memory().with_board(board);
        let user = MockUser::sales();

        let result = CreateProjectService::new(&ctx, &user).call(params()).await;
        assert_eq!(result.result().unwrap().stage, PipelineStage::MeetingScheduled);
    }

    #[tokio::test]
    async fn test_create_is_journaled() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::sales();

        let project = CreateProjectService::new(&ctx, &user)
            .call(params())
            .await
            .into_result()
            .unwrap();

        let history = ctx.journals.project_history(project.id.unwrap()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, JournalAction::Created);
        assert_eq!(history[0].to_state.as_deref(), Some("PROSPECT"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::sales();

        let result = CreateProjectService::new(&ctx, &user)
            .call(ProjectParams::new().with_name("   "))
            .await;

        assert!(result.is_failure());
        assert!(result.errors().has_error("name"));
    }

    #[tokio::test]
    async fn test_create_refuses_stage_param() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::sales();
        let mut params = params();
        params.stage = Some(PipelineStage::Won);

        let result = CreateProjectService::new(&ctx, &user).call(params).await;
        assert!(result.errors().has_error("stage"));
    }

    #[tokio::test]
    async fn test_engineering_cannot_create() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::engineer();

        let result = CreateProjectService::new(&ctx, &user).call(params()).await;
        assert_eq!(result.errors().kind, FailureKind::Forbidden);
        assert_eq!(ctx.stores.projects.count().await.unwrap(), 0);
    }
}
