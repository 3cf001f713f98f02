//! # sf-db
//!
//! Storage layer for SalesFlow.
//!
//! - Repository traits, one per entity
//! - In-memory stores used when no database is configured and in tests
//! - PostgreSQL stores on SQLx, with the schema under `migrations/`
//!
//! ## Example
//!
//! ```ignore
//! use sf_db::{Database, PoolSettings, Stores};
//!
//! let db = Database::connect(&PoolSettings::with_url(url)).await?;
//! db.migrate().await?;
//! let stores = Stores::postgres(db.pool().clone());
//! let project = stores.projects.find_by_id(1).await?;
//! ```

pub mod memory;
pub mod pg;
pub mod pool;
pub mod repository;
pub mod stores;

pub use pool::{Database, PoolSettings, PoolStats};
pub use repository::{
    DiscountPolicyRepository, EstimationRepository, ProjectRepository, QuotationRepository,
    Repository, RepositoryError, RepositoryResult, SalesOrderRepository, UserRepository,
};
pub use stores::{StorageKind, Stores};
