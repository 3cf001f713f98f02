//! # sf-services
//!
//! Workflow services for SalesFlow.
//!
//! One service object per command. Each checks its contract against the
//! current state, mutates, persists through the stores and journals the
//! transition. Failures come back as [`ValidationErrors`](sf_core::ValidationErrors)
//! whose kind tells the API which status to answer with.

pub mod base;
pub mod discounts;
pub mod estimations;
pub mod pipeline;
pub mod quotations;
pub mod result;
pub mod sales_orders;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use base::ServiceContext;
pub use result::ServiceResult;
