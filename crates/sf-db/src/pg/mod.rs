//! PostgreSQL stores
//!
//! Plain `sqlx::query_as` with runtime SQL; rows are mapped to models through
//! `TryFrom` so a bad enum value in the database surfaces as
//! [`RepositoryError::InvalidData`](crate::RepositoryError::InvalidData).

pub mod discount_policies;
pub mod estimations;
pub mod projects;
pub mod quotations;
pub mod sales_orders;
pub mod users;

pub use discount_policies::PgDiscountPolicyRepository;
pub use estimations::PgEstimationRepository;
pub use projects::PgProjectRepository;
pub use quotations::PgQuotationRepository;
pub use sales_orders::PgSalesOrderRepository;
pub use users::PgUserRepository;

use crate::repository::RepositoryError;

/// Parse a stored enum column
pub(crate) fn parse_column<T: std::str::FromStr>(column: &str, value: &str) -> Result<T, RepositoryError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| RepositoryError::InvalidData(format!("{column}: {e}")))
}

pub(crate) fn require_id(id: Option<i64>, type_name: &str) -> Result<i64, RepositoryError> {
    id.ok_or_else(|| RepositoryError::Validation(format!("{type_name} has no id")))
}
