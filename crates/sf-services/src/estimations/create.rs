//! Create Service for Estimations

use sf_contracts::base::{Contract, UserContext};
use sf_contracts::estimations::CreateEstimationContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::JournalAction;
use sf_models::{Estimation, EstimationStatus};

use super::{estimation_journal, NewEstimationParams};
use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// Request an estimation from engineering.
///
/// Each request is a new version; the previous one must have been rejected
/// or archived first.
pub struct CreateEstimationService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> CreateEstimationService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, project_id: Id, params: NewEstimationParams) -> ServiceResult<Estimation> {
        let user_id = self.user.id();
        ServiceResult::from(self.create(project_id, params).await)
            .on_success(|estimation| {
                tracing::info!(
                    project_id,
                    estimation_id = estimation.id,
                    version = estimation.version,
                    user_id,
                    "estimation requested"
                );
            })
            .on_failure(|errors| log_rejection("create_estimation", user_id, errors))
    }

    async fn create(&self, project_id: Id, params: NewEstimationParams) -> Result<Estimation, ValidationErrors> {
        let project = self.ctx.find_project(project_id).await?;
        let existing = self.ctx.stores.estimations.find_by_project(project_id).await?;
        let version = existing.iter().map(|e| e.version).max().unwrap_or(0) + 1;

        let mut estimation = Estimation::new(project_id, version, params.technical_brief, self.user.id());
        estimation.status = EstimationStatus::Pending;
        estimation.assigned_to = params.assigned_to;
        estimation.attachments = params.attachments;

        CreateEstimationContract::new(self.user, &project, &existing).validate(&estimation)?;

        let estimation = self.ctx.stores.estimations.create(estimation).await?;
        if let Some(journal) = estimation_journal(&estimation, JournalAction::Created, self.user.id()) {
            self.ctx
                .journal(journal.resulting_in(estimation.status).with_notes(format!("version {version}")))
                .await;
        }
        Ok(estimation)
    }
}
