//! # sf-contracts
//!
//! Contract validation for SalesFlow.
//!
//! Every command is checked here before a service touches storage: the
//! caller's permissions first, then field rules, then the state preconditions
//! of the Opportunity-to-Order lifecycle.

pub mod base;
pub mod discounts;
pub mod estimations;
pub mod pipeline;
pub mod projects;
pub mod quotations;
pub mod sales_orders;
pub mod users;

pub use base::*;
