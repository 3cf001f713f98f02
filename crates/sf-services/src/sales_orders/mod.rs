//! Closing projects: Won with a sales order, or Lost with a reason

mod create;
mod lost;
mod queries;

pub use create::{CreateSalesOrderService, SalesOrderParams};
pub use lost::MarkLostService;
pub use queries::SalesOrderQueries;
