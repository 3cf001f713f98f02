//! Stage moves

use sf_contracts::base::UserContext;
use sf_contracts::pipeline::{MoveStageContract, StageMove, StageTransition};
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::{Journal, JournalAction};
use sf_models::{PipelineStage, Project};

use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// Write a checked stage change and journal it as `action`.
///
/// Callers validate the transition first; quotations, sales orders and
/// Lost use this with their own contracts.
pub(crate) async fn persist_stage(
    ctx: &ServiceContext,
    mut project: Project,
    to: PipelineStage,
    action: JournalAction,
    user_id: Id,
    notes: Option<String>,
) -> Result<Project, ValidationErrors> {
    let from = project.stage;
    project.stage = to;
    let project = ctx.stores.projects.update(project).await?;

    if let Some(id) = project.id {
        let mut journal = Journal::project(id, action, user_id).transition(from, to);
        if let Some(notes) = notes {
            journal = journal.with_notes(notes);
        }
        ctx.journal(journal).await;
    }

    tracing::info!(project_id = project.id, %from, %to, user_id, "project stage changed");
    Ok(project)
}

/// Move a project to another stage on the board
pub struct MoveStageService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> MoveStageService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, project_id: Id, to: PipelineStage) -> ServiceResult<Project> {
        let user_id = self.user.id();
        ServiceResult::from(self.move_project(project_id, to).await)
            .on_failure(|errors| log_rejection("move_stage", user_id, errors))
    }

    async fn move_project(&self, project_id: Id, to: PipelineStage) -> Result<Project, ValidationErrors> {
        let project = self.ctx.find_project(project_id).await?;
        let step = StageMove {
            from: project.stage,
            to,
        };

        match MoveStageContract::new(self.user, &self.ctx.board).check(step)? {
            StageTransition::Unchanged => Ok(project),
            _ => persist_stage(self.ctx, project, to, JournalAction::StageChanged, self.user.id(), None).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_project, MockUser};
    use sf_core::error::FailureKind;
    use sf_models::Board;
    use PipelineStage::*;

    #[tokio::test]
    async fn test_forward_move_persists_and_journals() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, Prospect).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();

        let moved = MoveStageService::new(&ctx, &user)
            .call(id, PreSales)
            .await
            .into_result()
            .unwrap();
        assert_eq!(moved.stage, PreSales);

        let history = ctx.journals.project_history(id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.action, JournalAction::StageChanged);
        assert_eq!(last.from_state.as_deref(), Some("PROSPECT"));
        assert_eq!(last.to_state.as_deref(), Some("PRE_SALES"));
        assert_eq!(last.user_id, user.id);
    }

    #[tokio::test]
    async fn test_same_stage_is_a_no_op() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, MeetingScheduled).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user).call(id, MeetingScheduled).await;
        assert!(result.is_success());
        assert!(ctx.journals.project_history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_to_won_needs_a_sales_order() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, Prospect).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user).call(id, Won).await;
        assert_eq!(result.errors().kind, FailureKind::BusinessRule);

        let stored = ctx.find_project(id).await.unwrap();
        assert_eq!(stored.stage, Prospect);
        assert!(ctx.stores.sales_orders.find_by_project(id).await.unwrap().is_none());
        assert!(ctx.journals.project_history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_to_lost_needs_mark_lost() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, MeetingScheduled).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user).call(id, Lost).await;
        assert_eq!(result.errors().kind, FailureKind::BusinessRule);

        let stored = ctx.find_project(id).await.unwrap();
        assert_eq!(stored.stage, MeetingScheduled);
        assert_eq!(stored.lost_reason, None);
    }

    #[tokio::test]
    async fn test_backward_move_is_rejected() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, ProposalDelivered).await;
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user)
            .call(project.id.unwrap(), Prospect)
            .await;
        assert_eq!(result.errors().kind, FailureKind::BusinessRule);

        let stored = ctx.find_project(project.id.unwrap()).await.unwrap();
        assert_eq!(stored.stage, ProposalDelivered);
    }

    #[tokio::test]
    async fn test_closed_project_stays_closed() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, Lost).await;
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user)
            .call(project.id.unwrap(), PreSales)
            .await;
        assert!(result.is_failure());
    }

    #[tokio::test]
    async fn test_stage_off_the_board() {
        let board = Board::new(vec![Prospect, PreSales, Won, Lost]).unwrap();
        let ctx = ServiceContext::in_memory().with_board(board);
        let project = seed_project(&ctx, Prospect).await;
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user)
            .call(project.id.unwrap(), MeetingScheduled)
            .await;
        assert!(result.errors().has_error("new_status"));
    }

    #[tokio::test]
    async fn test_engineering_cannot_move() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, Prospect).await;
        let user = MockUser::engineer();

        let result = MoveStageService::new(&ctx, &user)
            .call(project.id.unwrap(), PreSales)
            .await;
        assert_eq!(result.errors().kind, FailureKind::Forbidden);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let ctx = ServiceContext::in_memory();
        let user = MockUser::sales();

        let result = MoveStageService::new(&ctx, &user).call(404, PreSales).await;
        assert_eq!(result.errors().kind, FailureKind::NotFound);
    }
}
