//! # sf-api
//!
//! REST API v1 handlers for SalesFlow.
//!
//! JSON over `/api/v1`; every route except sign-in and the root needs a
//! bearer token.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use extractors::AppState;
pub use routes::router;
