//! Read-side project queries

use sf_contracts::base::{require_permission, UserContext};
use sf_contracts::sales_orders::{available_actions, ProjectAction};
use sf_core::error::{FailureKind, ValidationErrors};
use sf_core::traits::Id;
use sf_journals::Journal;
use sf_models::{permissions, Project};

use crate::base::ServiceContext;
use crate::result::ServiceResult;

pub struct ProjectQueries<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> ProjectQueries<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    fn authorize(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::VIEW_PIPELINE, "view the pipeline", &mut errors);
        errors.into_result()
    }

    pub async fn list(&self) -> ServiceResult<Vec<Project>> {
        self.load_all().await.into()
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Project> {
        self.load(id).await.into()
    }

    /// Won/Lost actions offered to this user
    pub async fn actions(&self, id: Id) -> ServiceResult<Vec<ProjectAction>> {
        self.load(id)
            .await
            .map(|project| available_actions(self.user, &project))
            .into()
    }

    /// Journal entries for the project and everything attached to it, oldest first
    pub async fn history(&self, id: Id) -> ServiceResult<Vec<Journal>> {
        self.load_history(id).await.into()
    }

    async fn load_all(&self) -> Result<Vec<Project>, ValidationErrors> {
        self.authorize()?;
        Ok(self.ctx.stores.projects.find_all().await?)
    }

    async fn load(&self, id: Id) -> Result<Project, ValidationErrors> {
        self.authorize()?;
        self.ctx.find_project(id).await
    }

    async fn load_history(&self, id: Id) -> Result<Vec<Journal>, ValidationErrors> {
        self.load(id).await?;
        self.ctx.journals.project_history(id).await.map_err(|err| {
            tracing::error!(project_id = id, error = %err, "failed to read journals");
            ValidationErrors::of_kind(FailureKind::Internal, "Project history is unavailable")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::MoveStageService;
    use crate::test_support::{seed_project, MockUser};
    use sf_models::PipelineStage;

    #[tokio::test]
    async fn test_list_and_get() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::Prospect).await;
        seed_project(&ctx, PipelineStage::PreSales).await;
        let user = MockUser::finance();
        let queries = ProjectQueries::new(&ctx, &user);

        assert_eq!(queries.list().await.result().unwrap().len(), 2);
        let found = queries.get(project.id.unwrap()).await;
        assert_eq!(found.result().unwrap().name, "Plant automation");
        assert_eq!(queries.get(99).await.errors().kind, FailureKind::NotFound);
    }

    #[tokio::test]
    async fn test_actions_only_after_proposal() {
        let ctx = ServiceContext::in_memory();
        let open = seed_project(&ctx, PipelineStage::PreSales).await;
        let proposed = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let user = MockUser::sales();
        let queries = ProjectQueries::new(&ctx, &user);

        assert!(queries.actions(open.id.unwrap()).await.result().unwrap().is_empty());
        assert_eq!(
            queries.actions(proposed.id.unwrap()).await.result().unwrap(),
            &vec![ProjectAction::MarkWon, ProjectAction::MarkLost]
        );
    }

    #[tokio::test]
    async fn test_history_follows_moves() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::Prospect).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();
        MoveStageService::new(&ctx, &user)
            .call(id, PipelineStage::MeetingScheduled)
            .await;
        MoveStageService::new(&ctx, &user).call(id, PipelineStage::PreSales).await;

        let history = ProjectQueries::new(&ctx, &user).history(id).await;
        let stages: Vec<_> = history
            .result()
            .unwrap()
            .iter()
            .map(|j| j.to_state.clone().unwrap_or_default())
            .collect();
        assert_eq!(stages, vec!["MEETING_SCHEDULED", "PRE_SALES"]);
    }
}
