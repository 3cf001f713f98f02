//! The set of stores a running service works against

use std::sync::Arc;

use sqlx::PgPool;

use crate::memory::{
    MemoryDb, MemoryDiscountPolicyRepository, MemoryEstimationRepository,
    MemoryProjectRepository, MemoryQuotationRepository, MemorySalesOrderRepository,
    MemoryUserRepository,
};
use crate::pg::{
    PgDiscountPolicyRepository, PgEstimationRepository, PgProjectRepository,
    PgQuotationRepository, PgSalesOrderRepository, PgUserRepository,
};
use crate::repository::{
    DiscountPolicyRepository, EstimationRepository, ProjectRepository, QuotationRepository,
    SalesOrderRepository, UserRepository,
};

/// Which backend the stores were built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Postgres,
}

#[derive(Clone)]
pub struct Stores {
    pub kind: StorageKind,
    pub projects: Arc<dyn ProjectRepository>,
    pub estimations: Arc<dyn EstimationRepository>,
    pub policies: Arc<dyn DiscountPolicyRepository>,
    pub quotations: Arc<dyn QuotationRepository>,
    pub sales_orders: Arc<dyn SalesOrderRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Stores {
    /// Fresh, empty in-memory stores
    pub fn memory() -> Self {
        let db = MemoryDb::new();
        Self {
            kind: StorageKind::Memory,
            projects: Arc::new(MemoryProjectRepository::new(db.clone())),
            estimations: Arc::new(MemoryEstimationRepository::new(db.clone())),
            policies: Arc::new(MemoryDiscountPolicyRepository::new(db.clone())),
            quotations: Arc::new(MemoryQuotationRepository::new(db.clone())),
            sales_orders: Arc::new(MemorySalesOrderRepository::new(db.clone())),
            users: Arc::new(MemoryUserRepository::new(db)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            kind: StorageKind::Postgres,
            projects: Arc::new(PgProjectRepository::new(pool.clone())),
            estimations: Arc::new(PgEstimationRepository::new(pool.clone())),
            policies: Arc::new(PgDiscountPolicyRepository::new(pool.clone())),
            quotations: Arc::new(PgQuotationRepository::new(pool.clone())),
            sales_orders: Arc::new(PgSalesOrderRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool)),
        }
    }
}
