//! Sales order lookups

use sf_contracts::base::{require_permission, UserContext};
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_models::{permissions, SalesOrder};

use crate::base::{not_found, ServiceContext};
use crate::result::ServiceResult;

pub struct SalesOrderQueries<'a, U: UserContext> {
    ctx: &'a ServiceContext,
    user: &'a U,
}

impl<'a, U: UserContext> SalesOrderQueries<'a, U> {
    pub fn new(ctx: &'a ServiceContext, user: &'a U) -> Self {
        Self { ctx, user }
    }

    pub async fn list(&self) -> ServiceResult<Vec<SalesOrder>> {
        self.load_all().await.into()
    }

    pub async fn get(&self, id: Id) -> ServiceResult<SalesOrder> {
        self.load(id).await.into()
    }

    fn authorize(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::VIEW_SALES_ORDERS, "view sales orders", &mut errors);
        errors.into_result()
    }

    async fn load_all(&self) -> Result<Vec<SalesOrder>, ValidationErrors> {
        self.authorize()?;
        let mut orders = self.ctx.stores.sales_orders.find_all().await?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn load(&self, id: Id) -> Result<SalesOrder, ValidationErrors> {
        self.authorize()?;
        self.ctx
            .stores
            .sales_orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Sales order", id))
    }
}
