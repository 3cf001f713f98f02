//! Discount requests from Sales
//!
//! Every accepted request waits for the CEO. A discount inside the
//! requester's authority needs no request at all: the quotation gate lets
//! it through on an approved estimation.

use sf_contracts::base::UserContext;
use sf_contracts::discounts::{DiscountRequest, RequestDiscountContract};
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::JournalAction;
use sf_models::{DiscountClass, Estimation, EstimationStatus};

use super::effective_policy;
use crate::base::{log_rejection, ServiceContext};
use crate::estimations::estimation_journal;
use crate::result::ServiceResult;

pub struct RequestDiscountService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> RequestDiscountService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, estimation_id: Id, percent: f64) -> ServiceResult<Estimation> {
        let user_id = self.user.id();
        ServiceResult::from(self.request(estimation_id, percent).await)
            .on_success(|estimation| {
                tracing::info!(
                    estimation_id,
                    percent,
                    status = %estimation.status,
                    user_id,
                    "discount requested"
                );
            })
            .on_failure(|errors| log_rejection("request_discount", user_id, errors))
    }

    async fn request(&self, estimation_id: Id, percent: f64) -> Result<Estimation, ValidationErrors> {
        let mut estimation = self.ctx.find_estimation(estimation_id).await?;
        let policy = effective_policy(self.ctx, self.user).await?;
        let class = RequestDiscountContract::new(self.user, &policy).check(DiscountRequest {
            estimation: &estimation,
            percent,
        })?;

        let from = estimation.status;
        estimation.status = EstimationStatus::PendingDiscountApproval;
        estimation.requested_discount = Some(percent);
        estimation.requested_by = Some(self.user.id());
        estimation.approved_discount = None;
        estimation.approved_by = None;
        estimation.discount_decided_at = None;

        let estimation = self.ctx.stores.estimations.update(estimation).await?;
        if let Some(journal) = estimation_journal(&estimation, JournalAction::DiscountRequested, self.user.id()) {
            let notes = match class {
                DiscountClass::WithinAuthority => format!("{percent}% requested, within authority"),
                _ => format!("{percent}% requested"),
            };
            self.ctx
                .journal(journal.transition(from, estimation.status).with_notes(notes))
                .await;
        }
        Ok(estimation)
    }
}
