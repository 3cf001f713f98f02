//! Delete Service for Projects

use serde::Serialize;
use sf_contracts::base::{Contract, UserContext};
use sf_contracts::pipeline::{check_transition, StageMove};
use sf_contracts::projects::DeleteProjectContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_db::RepositoryError;
use sf_journals::{Journal, JournalAction};
use sf_models::{PipelineStage, Project};

use super::persist_stage;
use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// Reason stored when a project with dependent records is removed
pub const REMOVED_REASON: &str = "Removed";

/// What a delete request ended up doing
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeleteOutcome {
    Deleted { id: Id },
    /// Dependent records exist; the project was closed as Lost instead
    MarkedLost { project: Box<Project> },
}

pub struct DeleteProjectService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> DeleteProjectService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, id: Id) -> ServiceResult<DeleteOutcome> {
        let user_id = self.user.id();
        ServiceResult::from(self.delete(id).await)
            .on_success(|outcome| tracing::info!(project_id = id, user_id, ?outcome, "project removed"))
            .on_failure(|errors| log_rejection("delete_project", user_id, errors))
    }

    async fn delete(&self, id: Id) -> Result<DeleteOutcome, ValidationErrors> {
        let project = self.ctx.find_project(id).await?;
        DeleteProjectContract::new(self.user).validate(&project)?;

        match self.ctx.stores.projects.delete(id).await {
            Ok(()) => {
                self.ctx
                    .journal(
                        Journal::project(id, JournalAction::Deleted, self.user.id())
                            .transition(project.stage, "DELETED"),
                    )
                    .await;
                Ok(DeleteOutcome::Deleted { id })
            }
            Err(RepositoryError::Conflict(reason)) => self.soft_remove(project, reason).await,
            Err(err) => Err(err.into()),
        }
    }

    async fn soft_remove(&self, mut project: Project, reason: String) -> Result<DeleteOutcome, ValidationErrors> {
        tracing::debug!(project_id = project.id, %reason, "delete refused by store, closing as lost");
        let step = StageMove {
            from: project.stage,
            to: PipelineStage::Lost,
        };
        if project.is_closed() {
            return Err(ValidationErrors::of_kind(
                sf_core::error::FailureKind::Conflict,
                format!("Project is closed as {} and has dependent records", project.stage.label()),
            ));
        }
        check_transition(&self.ctx.board, step)?;

        project.lost_reason = Some(REMOVED_REASON.to_string());
        let project = persist_stage(
            self.ctx,
            project,
            PipelineStage::Lost,
            JournalAction::MarkedLost,
            self.user.id(),
            Some(REMOVED_REASON.to_string()),
        )
        .await?;
        Ok(DeleteOutcome::MarkedLost {
            project: Box::new(project),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_estimation, seed_project, MockUser};
    use sf_core::error::FailureKind;
    use sf_models::EstimationStatus;

    #[tokio::test]
    async fn test_hard_delete_without_dependents() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::Prospect).await;
        let id = project.id.unwrap();
        let user = MockUser::manager();

        let outcome = DeleteProjectService::new(&ctx, &user)
            .call(id)
            .await
            .into_result()
            .unwrap();

        assert!(matches!(outcome, DeleteOutcome::Deleted { id: deleted } if deleted == id));
        assert!(!ctx.stores.projects.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_dependents_mark_lost_instead() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        seed_estimation(&ctx, &project, EstimationStatus::Pending).await;
        let user = MockUser::manager();

        let outcome = DeleteProjectService::new(&ctx, &user)
            .call(project.id.unwrap())
            .await
            .into_result()
            .unwrap();

        match outcome {
            DeleteOutcome::MarkedLost { project } => {
                assert_eq!(project.stage, PipelineStage::Lost);
                assert_eq!(project.lost_reason.as_deref(), Some(REMOVED_REASON));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sales_cannot_delete() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::Prospect).await;
        let user = MockUser::sales();

        let result = DeleteProjectService::new(&ctx, &user).call(project.id.unwrap()).await;
        assert_eq!(result.errors().kind, FailureKind::Forbidden);
        assert!(ctx.stores.projects.exists(project.id.unwrap()).await.unwrap());
    }
}
