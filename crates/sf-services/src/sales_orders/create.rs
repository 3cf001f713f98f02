//! Won: sales order creation
//!
//! The order is stored first and the project then moves to Won. A failed
//! move deletes the order again, so a project is Won exactly when it has an
//! order.

use chrono::NaiveDate;
use serde::Deserialize;
use sf_contracts::base::{Contract, UserContext};
use sf_contracts::pipeline::{check_transition, StageMove};
use sf_contracts::sales_orders::CreateSalesOrderContract;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_core::types::lenient_amount;
use sf_journals::{Journal, JournalAction, JournalType};
use sf_models::{PaymentTerms, PipelineStage, SalesOrder};

use crate::base::{log_rejection, ServiceContext};
use crate::pipeline::persist_stage;
use crate::result::ServiceResult;

/// Fields of the Won dialog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderParams {
    #[serde(default)]
    pub customer_po_number: String,
    pub order_date: NaiveDate,
    pub payment_terms: PaymentTerms,
    /// Defaults to the project's contract value, then its estimated value
    #[serde(default, deserialize_with = "lenient_amount")]
    pub contract_value: Option<f64>,
    #[serde(default)]
    pub document_ref: String,
}

impl SalesOrderParams {
    pub fn new(
        customer_po_number: impl Into<String>,
        order_date: NaiveDate,
        payment_terms: PaymentTerms,
        document_ref: impl Into<String>,
    ) -> Self {
        Self {
            customer_po_number: customer_po_number.into(),
            order_date,
            payment_terms,
            contract_value: None,
            document_ref: document_ref.into(),
        }
    }

    pub fn with_contract_value(mut self, value: f64) -> Self {
        self.contract_value = Some(value);
        self
    }
}

pub struct CreateSalesOrderService<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> CreateSalesOrderService<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn call(self, project_id: Id, params: SalesOrderParams) -> ServiceResult<SalesOrder> {
        let user_id = self.user.id();
        ServiceResult::from(self.create(project_id, params).await)
            .on_success(|order| {
                tracing::info!(
                    project_id,
                    order_number = %order.order_number,
                    contract_value = order.contract_value,
                    user_id,
                    "project won"
                );
            })
            .on_failure(|errors| log_rejection("create_sales_order", user_id, errors))
    }

    async fn create(&self, project_id: Id, params: SalesOrderParams) -> Result<SalesOrder, ValidationErrors> {
        let mut project = self.ctx.find_project(project_id).await?;

        let contract_value = params
            .contract_value
            .or(project.contract_value)
            .or(project.estimated_value)
            .unwrap_or(0.0);
        let order = SalesOrder {
            id: None,
            order_number: String::new(),
            project_id,
            customer_po_number: params.customer_po_number.trim().to_string(),
            order_date: params.order_date,
            payment_terms: params.payment_terms,
            contract_value,
            document_ref: params.document_ref.trim().to_string(),
            created_by: self.user.id(),
            created_at: None,
        };

        CreateSalesOrderContract::new(self.user, &project).validate(&order)?;
        check_transition(
            &self.ctx.board,
            StageMove {
                from: project.stage,
                to: PipelineStage::Won,
            },
        )?;

        let order = self.ctx.stores.sales_orders.create(order).await?;
        let order_id = order.id.unwrap_or_default();

        project.contract_value = Some(order.contract_value);
        if let Err(errors) = persist_stage(
            self.ctx,
            project,
            PipelineStage::Won,
            JournalAction::StageChanged,
            self.user.id(),
            Some(order.order_number.clone()),
        )
        .await
        {
            if let Err(err) = self.ctx.stores.sales_orders.delete(order_id).await {
                tracing::error!(order_id, error = %err, "failed to remove sales order after stage move failed");
            }
            return Err(errors);
        }

        self.ctx
            .journal(
                Journal::new(
                    JournalType::SalesOrder,
                    order_id,
                    project_id,
                    JournalAction::SalesOrderCreated,
                    self.user.id(),
                )
                .resulting_in(&order.order_number)
                .with_notes(format!(
                    "PO {}, {}",
                    order.customer_po_number,
                    order.payment_terms.label()
                )),
            )
            .await;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{refuse_project_updates, seed_project, MockUser, REFUSED_UPDATE};
    use sf_core::error::FailureKind;

    fn params() -> SalesOrderParams {
        SalesOrderParams::new(
            "PO-88231",
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            PaymentTerms::Net30,
            "uploads/po-88231.pdf",
        )
    }

    #[tokio::test]
    async fn test_order_marks_project_won() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let id = project.id.unwrap();
        let user = MockUser::sales();

        let order = CreateSalesOrderService::new(&ctx, &user)
            .call(id, params())
            .await
            .into_result()
            .unwrap();

        assert!(order.order_number.starts_with("SO-2025-"));
        assert_eq!(order.contract_value, 40_000.0);
        assert_eq!(order.payment_terms_days(), 30);

        let project = ctx.find_project(id).await.unwrap();
        assert_eq!(project.stage, PipelineStage::Won);
        assert_eq!(project.contract_value, Some(40_000.0));

        let history = ctx.journals.project_history(id).await.unwrap();
        assert_eq!(history.last().unwrap().action, JournalAction::SalesOrderCreated);
    }

    #[tokio::test]
    async fn test_explicit_contract_value() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let user = MockUser::sales();

        let order = CreateSalesOrderService::new(&ctx, &user)
            .call(project.id.unwrap(), params().with_contract_value(36_500.0))
            .await
            .into_result()
            .unwrap();
        assert_eq!(order.contract_value, 36_500.0);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let user = MockUser::sales();
        let mut params = params();
        params.customer_po_number = " ".into();
        params.document_ref = String::new();
        params.payment_terms = PaymentTerms::Custom { days: 400 };

        let result = CreateSalesOrderService::new(&ctx, &user)
            .call(project.id.unwrap(), params)
            .await;

        let errors = result.errors();
        assert!(errors.has_error("customer_po_number"));
        assert!(errors.has_error("document_ref"));
        assert!(errors.has_error("payment_terms"));
    }

    #[tokio::test]
    async fn test_requires_delivered_proposal() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::PreSales).await;
        let user = MockUser::sales();

        let result = CreateSalesOrderService::new(&ctx, &user)
            .call(project.id.unwrap(), params())
            .await;
        assert_eq!(result.errors().kind, FailureKind::BusinessRule);
    }

    #[tokio::test]
    async fn test_failed_move_removes_order() {
        let mut ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let id = project.id.unwrap();
        refuse_project_updates(&mut ctx);
        let user = MockUser::sales();

        let result = CreateSalesOrderService::new(&ctx, &user).call(id, params()).await;

        assert_eq!(result.errors().first_message().as_deref(), Some(REFUSED_UPDATE));
        assert!(ctx.stores.sales_orders.find_by_project(id).await.unwrap().is_none());
        assert_eq!(ctx.find_project(id).await.unwrap().stage, PipelineStage::ProposalDelivered);
    }

    #[tokio::test]
    async fn test_engineering_cannot_close() {
        let ctx = ServiceContext::in_memory();
        let project = seed_project(&ctx, PipelineStage::ProposalDelivered).await;
        let user = MockUser::engineer();

        let result = CreateSalesOrderService::new(&ctx, &user)
            .call(project.id.unwrap(), params())
            .await;
        assert_eq!(result.errors().kind, FailureKind::Forbidden);
    }
}
