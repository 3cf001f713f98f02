//! # sf-models
//!
//! Domain models for SalesFlow.
//!
//! Entities of the Opportunity-to-Order lifecycle: projects moving through
//! board stages, versioned estimations with their discount sub-flow,
//! discount policies, quotations, and sales orders. Each model implements the
//! core traits from `sf-core`.

pub use sf_core::traits::{Entity, Id, Identifiable, ProjectScoped, Timestamped};

pub mod discount;
pub mod estimation;
pub mod project;
pub mod quotation;
pub mod role;
pub mod sales_order;
pub mod stage;
pub mod user;

pub use discount::{DiscountClass, DiscountDecision, DiscountPolicy};
pub use estimation::{Estimation, EstimationStatus, LineItem};
pub use project::{Priority, Project};
pub use quotation::{Quotation, QuotationLine};
pub use role::{permissions, Role};
pub use sales_order::{PaymentTerms, SalesOrder};
pub use stage::{Board, BoardError, PipelineStage};
pub use user::UserAccount;

/// Error returned when a wire name does not match any variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
