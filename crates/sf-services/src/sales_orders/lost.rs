//! Lost

use sf_contracts::base::{Contract, UserContext};
use sf_contracts::pipeline::{check_transition, StageMove};
use sf_contracts::sales_orders::{LostRequest, MarkLostContract};
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::JournalAction;
use sf_models::{PipelineStage, Project};

use crate::base::{log_rejection, ServiceContext};
use crate::pipeline::persist_stage;
use crate::result::ServiceResult;

pub struct MarkLostService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> MarkLostService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, project_id: Id, reason: &str) -> ServiceResult<Project> {
        let user_id = self.user.id();
        ServiceResult::from(self.mark_lost(project_id, reason).await)
            .on_failure(|errors| log_rejection("mark_lost", user_id, errors))
    }

    async fn mark_lost(&self, project_id: Id, reason: &str) -> Result<Project, ValidationErrors> {
        let mut project = self.ctx.find_project(project_id).await?;
        MarkLostContract::new(self.user).validate(&LostRequest {
            project: &project,
            reason,
        })?;
        check_transition(
            &self.ctx.board,
            StageMove {
                from: project.stage,
                to: PipelineStage::Lost,
            },
        )?;

        let reason = reason.trim().to_string();
        project.lost_reason = Some(reason.clone());
        persist_stage(
            self.ctx,
            project,
            PipelineStage::Lost,
            JournalAction::MarkedLost,
            self.user.id(),
            Some(reason),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_project, MockUser};
    use sf_core::error::FailureKind;

    #[tokio::test]
    async fn test_mark_lost_stores_reason() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();

        let lost = MarkLostService::new(&ctx, &user)
            .call(id, "  Went with a competitor ")
            .await
            .into_result()
            .unwrap();
        assert_eq!(lost.stage, PipelineStage::Lost);
        assert_eq!(lost.lost_reason.as_deref(), Some("Went with a competitor"));

        let history = ctx.journals.project_history(id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.action, JournalAction::MarkedLost);
        assert_eq!(last.notes.as_deref(), Some("Went with a competitor"));
    }

    #[tokio::test]
    async fn test_blank_reason() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let user = MockUser::sales();

        let result = MarkLostService::new(&ctx, &user).call(project.id.unwrap(), "   ").await;
        assert!(result.errors().has_error("reason"));
        let stored = ctx.find_project(project.id.unwrap()).await.unwrap();
        assert_eq!(stored.stage, PipelineStage::ProposalDelivered);
    }

    #[tokio::test]
    async fn test_only_after_proposal() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::MeetingScheduled).await;
        let user = MockUser::sales();

        let result = MarkLostService::new(&ctx, &user)
            .call(project.id.unwrap(), "Budget cut")
            .await;
        assert_eq!(result.errors().kind, FailureKind::BusinessRule);
    }
}
