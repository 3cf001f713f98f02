//! Quotation generation
//!
//! Gate, price, persist, then deliver: the project moves to Proposal
//! Delivered. If that move fails the stored quotation is deleted again, so a
//! quotation exists only for projects with a delivered proposal.

use chrono::Utc;
use sf_contracts::base::{require_permission, UserContext};
use sf_contracts::pipeline::{check_transition, StageMove};
use sf_contracts::quotations::GenerateQuotationContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_journals::{Journal, JournalAction, JournalType};
use sf_models::{permissions, PipelineStage, Quotation};

use crate::base::{log_rejection, not_found, ServiceContext};
use crate::discounts::effective_policy;
use crate::pipeline::persist_stage;
use crate::result::ServiceResult;

pub struct GenerateQuotationService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> GenerateQuotationService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    /// `percent` is ignored when a discount has already been approved
    pub async fn call(self, estimation_id: Id, percent: f64) -> ServiceResult<Quotation> {
        let user_id = self.user.id();
        ServiceResult::from(self.generate(estimation_id, percent).await)
            .on_success(|quotation| {
                tracing::info!(
                    project_id = quotation.project_id,
                    estimation_id,
                    number = %quotation.number,
                    discount = quotation.discount_percent,
                    total = quotation.total,
                    user_id,
                    "quotation generated"
                );
            })
            .on_failure(|errors| log_rejection("generate_quotation", user_id, errors))
    }

    async fn generate(&self, estimation_id: Id, percent: f64) -> Result<Quotation, ValidationErrors> {
        let estimation = self.ctx.find_estimation(estimation_id).await?;
        let project = self.ctx.find_project(estimation.project_id).await?;
        let policy = effective_policy(self.ctx, self.user).await?;

        let discount = GenerateQuotationContract::new(self.user, &policy).check(&project, &estimation, percent)?;
        check_transition(
            &self.ctx.board,
            StageMove {
                from: project.stage,
                to: PipelineStage::ProposalDelivered,
            },
        )?;

        let priced = Quotation::price(&project, &estimation, discount, self.user.id(), Utc::now());
        let quotation = self.ctx.stores.quotations.create(priced).await?;
        let quotation_id = quotation.id.unwrap_or_default();

        if let Err(errors) = persist_stage(
            self.ctx,
            project,
            PipelineStage::ProposalDelivered,
            JournalAction::StageChanged,
            self.user.id(),
            Some(quotation.number.clone()),
        )
        .await
        {
            self.discard(quotation_id).await;
            return Err(errors);
        }

        self.ctx
            .journal(
                Journal::new(
                    JournalType::Quotation,
                    quotation_id,
                    quotation.project_id,
                    JournalAction::QuotationGenerated,
                    self.user.id(),
                )
                .resulting_in(&quotation.number)
                .with_notes(format!("{}% discount, total {:.2}", quotation.discount_percent, quotation.total)),
            )
            .await;
        Ok(quotation)
    }

    async fn discard(&self, quotation_id: Id) {
        if let Err(err) = self.ctx.stores.quotations.delete(quotation_id).await {
            tracing::error!(quotation_id, error = %err, "failed to remove quotation after stage move failed");
        }
    }
}

pub struct QuotationQueries<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> QuotationQueries<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Quotation> {
        self.load(id).await.into()
    }

    pub async fn for_project(&self, project_id: Id) -> ServiceResult<Vec<Quotation>> {
        self.load_for_project(project_id).await.into()
    }

    fn authorize(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::VIEW_PIPELINE, "view quotations", &mut errors);
        errors.into_result()
    }

    async fn load(&self, id: Id) -> Result<Quotation, ValidationErrors> {
        self.authorize()?;
        self.ctx
            .stores
            .quotations
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Quotation", id))
    }

    async fn load_for_project(&self, project_id: Id) -> Result<Vec<Quotation>, ValidationErrors> {
        self.authorize()?;
        Ok(self.ctx.stores.quotations.find_by_project(project_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discounts::{DecideDiscountService, PolicyService, RequestDiscountService};
    use crate::test_support::{refuse_project_updates, seed_estimation, seed_project, MockUser, REFUSED_UPDATE};
    use sf_core::error::FailureKind;
    use sf_models::{DiscountDecision, Estimation, EstimationStatus, LineItem, Role};

    async fn with_policy() -> ServiceContext {
        let ctx = ServiceContext::in_memory();
        PolicyService::new(&ctx, &MockUser::ceo())
            .upsert(Role::Sales, 10.0, 20.0)
            .await
            .into_result()
            .unwrap();
        ctx
    }

    /// Sales asks for `percent`, the CEO approves it
    async fn ceo_approved(ctx: &ServiceContext, estimation: &Estimation, percent: f64) {
        let id = estimation.id.unwrap();
        RequestDiscountService::new(ctx, &MockUser::sales())
            .call(id, percent)
            .await
            .into_result()
            .unwrap();
        DecideDiscountService::new(ctx, &MockUser::ceo())
            .call(id, DiscountDecision::Approve)
            .await
            .into_result()
            .unwrap();
    }

    #[tokio::test]
    async fn test_generate_within_authority() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let mut estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        estimation.line_items = vec![
            LineItem::new("Control cabinet", 2.0, 7_500.0),
            LineItem::new("Engineering hours", 40.0, 125.0),
        ];
        let estimation = ctx.stores.estimations.update(estimation).await.unwrap();
        let user = MockUser::sales();

        let quotation = GenerateQuotationService::new(&ctx, &user)
            .call(estimation.id.unwrap(), 10.0)
            .await
            .into_result()
            .unwrap();

        assert_eq!(quotation.subtotal, 20_000.0);
        assert_eq!(quotation.discount_amount, 2_000.0);
        assert_eq!(quotation.total, 18_000.0);
        assert!(quotation.number.starts_with("QT-"));

        let project = ctx.find_project(project.id.unwrap()).await.unwrap();
        assert_eq!(project.stage, PipelineStage::ProposalDelivered);

        let stored = ctx.find_estimation(estimation.id.unwrap()).await.unwrap();
        assert_eq!(stored.requested_discount, None);
        assert_eq!(stored.status, EstimationStatus::Approved);
    }

    #[tokio::test]
    async fn test_without_line_items_uses_estimated_value() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        let user = MockUser::sales();

        let quotation = GenerateQuotationService::new(&ctx, &user)
            .call(estimation.id.unwrap(), 0.0)
            .await
            .into_result()
            .unwrap();
        assert_eq!(quotation.lines.len(), 1);
        assert_eq!(quotation.total, 40_000.0);
    }

    #[tokio::test]
    async fn test_above_authority_is_blocked() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        let user = MockUser::sales();

        let result = GenerateQuotationService::new(&ctx, &user)
            .call(estimation.id.unwrap(), 15.0)
            .await;

        assert_eq!(result.errors().kind, FailureKind::BusinessRule);
        let project = ctx.find_project(project.id.unwrap()).await.unwrap();
        assert_eq!(project.stage, PipelineStage::PreSales);
        assert_eq!(ctx.stores.quotations.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approved_discount_overrides_requested_percent() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        ceo_approved(&ctx, &estimation, 15.0).await;
        let user = MockUser::sales();

        let quotation = GenerateQuotationService::new(&ctx, &user)
            .call(estimation.id.unwrap(), 19.0)
            .await
            .into_result()
            .unwrap();
        assert_eq!(quotation.discount_percent, 15.0);
        assert_eq!(quotation.total, 34_000.0);
    }

    #[tokio::test]
    async fn test_regenerating_keeps_approved_discount() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        let id = estimation.id.unwrap();
        ceo_approved(&ctx, &estimation, 15.0).await;
        let user = MockUser::sales();
        let service = || GenerateQuotationService::new(&ctx, &user);

        assert!(service().call(id, 0.0).await.is_success());
        let again = service().call(id, 0.0).await;
        assert_eq!(again.errors().kind, FailureKind::Conflict);

        let stored = ctx.find_estimation(id).await.unwrap();
        assert_eq!(stored.status, EstimationStatus::DiscountApproved);
        assert_eq!(stored.approved_discount, Some(15.0));
        assert_eq!(stored.requested_discount, Some(15.0));
        assert_eq!(ctx.stores.quotations.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_quotation_conflicts() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        let user = MockUser::sales();
        let service = || GenerateQuotationService::new(&ctx, &user);

        assert!(service().call(estimation.id.unwrap(), 0.0).await.is_success());
        let again = service().call(estimation.id.unwrap(), 0.0).await;
        assert_eq!(again.errors().kind, FailureKind::Conflict);
    }

    #[tokio::test]
    async fn test_failed_delivery_removes_quotation() {
        let mut ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        refuse_project_updates(&mut ctx);
        let user = MockUser::sales();

        let result = GenerateQuotationService::new(&ctx, &user)
            .call(estimation.id.unwrap(), 0.0)
            .await;

        assert!(result.is_failure());
        assert_eq!(result.errors().first_message().as_deref(), Some(REFUSED_UPDATE));
        assert_eq!(ctx.stores.quotations.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_quotation() {
        let ctx = with_policy().await;
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let estimation = seed_estimation(&ctx, &project, EstimationStatus::Approved).await;
        let user = MockUser::sales();
        let quotation = GenerateQuotationService::new(&ctx, &user)
            .call(estimation.id.unwrap(), 0.0)
            .await
            .into_result()
            .unwrap();

        let finance = MockUser::finance();
        let queries = QuotationQueries::new(&ctx, &finance);
        let found = queries.get(quotation.id.unwrap()).await.into_result().unwrap();
        assert_eq!(found.number, quotation.number);
        assert_eq!(queries.for_project(project.id.unwrap()).await.result().unwrap().len(), 1);
        assert_eq!(queries.get(404).await.errors().kind, FailureKind::NotFound);
    }
}
