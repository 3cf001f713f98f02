//! Update Service for Estimations

use sf_contracts::base::{ChangeTracker, Contract, UserContext};
use sf_contracts::estimations::UpdateEstimationContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::JournalAction;
use sf_models::Estimation;

use super::{estimation_journal, EstimationParams};
use crate::base::{log_rejection, ServiceContext};
use crate::result::ServiceResult;

/// Engineering edits and status transitions
pub struct UpdateEstimationService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> UpdateEstimationService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, id: Id, params: EstimationParams) -> ServiceResult<Estimation> {
        let user_id = self.user.id();
        ServiceResult::from(self.update(id, params).await)
            .on_success(|estimation| {
                tracing::info!(
                    estimation_id = id,
                    status = %estimation.status,
                    user_id,
                    "estimation updated"
                );
            })
            .on_failure(|errors| log_rejection("update_estimation", user_id, errors))
    }

    async fn update(&self, id: Id, params: EstimationParams) -> Result<Estimation, ValidationErrors> {
        let before = self.ctx.find_estimation(id).await?;
        let mut after = before.clone();
        let contract = UpdateEstimationContract::new(self.user, &before);

        let mut changes = ChangeTracker::new();
        for attribute in params.apply(&mut after) {
            changes.mark_changed(attribute);
        }

        let mut errors = ValidationErrors::new();
        changes.validate_writable(&contract, &mut errors);
        if let Err(contract_errors) = contract.validate(&after) {
            errors.merge(contract_errors);
        }
        errors.into_result()?;

        if changes.changed_attributes().is_empty() {
            return Ok(before);
        }

        let after = self.ctx.stores.estimations.update(after).await?;

        let journal = if before.status != after.status {
            estimation_journal(&after, JournalAction::StatusChanged, self.user.id())
                .map(|j| j.transition(before.status, after.status))
        } else {
            let mut changed: Vec<&str> = changes.changed_attributes().iter().map(String::as_str).collect();
            changed.sort_unstable();
            estimation_journal(&after, JournalAction::Updated, self.user.id())
                .map(|j| j.with_notes(changed.join(", ")))
        };
        if let Some(journal) = journal {
            self.ctx.journal(journal).await;
        }
        Ok(after)
    }
}
