//! CEO decisions on escalated discounts

use chrono::Utc;
use sf_contracts::base::{Contract, UserContext};
use sf_contracts::discounts::DecideDiscountContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::JournalAction;
use sf_models::{DiscountDecision, Estimation, EstimationStatus};

use crate::base::{log_rejection, ServiceContext};
use crate::estimations::estimation_journal;
use crate::result::ServiceResult;

/// Approve or reject a pending request as asked; the amount is never changed
pub struct DecideDiscountService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> DecideDiscountService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, estimation_id: Id, decision: DiscountDecision) -> ServiceResult<Estimation> {
        let user_id = self.user.id();
        ServiceResult::from(self.decide(estimation_id, decision).await)
            .on_success(|estimation| {
                tracing::info!(
                    estimation_id,
                    decision = decision.as_str(),
                    approved = estimation.approved_discount,
                    user_id,
                    "discount decided"
                );
            })
            .on_failure(|errors| log_rejection("decide_discount", user_id, errors))
    }

    async fn decide(&self, estimation_id: Id, decision: DiscountDecision) -> Result<Estimation, ValidationErrors> {
        let mut estimation = self.ctx.find_estimation(estimation_id).await?;
        DecideDiscountContract::new(self.user).validate(&estimation)?;

        let from = estimation.status;
        match decision {
            DiscountDecision::Approve => {
                estimation.status = EstimationStatus::DiscountApproved;
                estimation.approved_discount = estimation.requested_discount;
            }
            DiscountDecision::Reject => {
                estimation.status = EstimationStatus::DiscountRejected;
                estimation.approved_discount = None;
            }
        }
        estimation.approved_by = Some(self.user.id());
        estimation.discount_decided_at = Some(Utc::now());

        let estimation = self.ctx.stores.estimations.update(estimation).await?;
        if let Some(journal) = estimation_journal(&estimation, JournalAction::DiscountDecided, self.user.id()) {
            self.ctx
                .journal(journal.transition(from, estimation.status).with_notes(decision.as_str()))
                .await;
        }
        Ok(estimation)
    }
}
