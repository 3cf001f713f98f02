//! Discount authority
//!
//! Requests inside a user's authority are granted on the spot; larger ones
//! wait for the CEO. Policies are per role.

mod decide;
mod policies;
mod request;

pub use decide::DecideDiscountService;
pub use policies::{effective_policy, PolicyService};
pub use request::RequestDiscountService;
