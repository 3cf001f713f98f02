//! # sf-core
//!
//! Core types, traits, and utilities for SalesFlow.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Error taxonomy shared by contracts, services, and the API
//! - Result type aliases
//! - Core entity traits (Identifiable, Timestamped, Entity)
//! - Layered application configuration
//! - Lenient monetary helpers

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
