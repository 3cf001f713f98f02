//! Repository traits
//!
//! Every store has an in-memory and a PostgreSQL implementation behind the
//! same trait, so services never know which one they talk to.

use async_trait::async_trait;
use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_models::{DiscountPolicy, Estimation, Project, Quotation, Role, SalesOrder, UserAccount};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A constraint refused the write (unique key, dependent rows)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a model
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return RepositoryError::NotFound("row not found".to_string());
        }
        let classified = err.as_database_error().and_then(|db| {
            let message = db.message().to_string();
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) => {
                    Some(RepositoryError::Conflict(message))
                }
                Some(CHECK_VIOLATION) => Some(RepositoryError::Validation(message)),
                _ => None,
            }
        });
        classified.unwrap_or(RepositoryError::Database(err))
    }
}

impl From<RepositoryError> for ValidationErrors {
    fn from(err: RepositoryError) -> Self {
        let mut errors = ValidationErrors::new();
        match err {
            RepositoryError::NotFound(message) => errors.not_found(message),
            RepositoryError::Conflict(message) => errors.conflict(message),
            RepositoryError::Validation(message) => errors.add_base(message),
            RepositoryError::Database(source) => {
                tracing::error!(error = %source, "storage failure");
                errors.internal("The storage backend is unavailable");
            }
            RepositoryError::InvalidData(message) => {
                tracing::error!(%message, "unreadable stored row");
                errors.internal("Stored data could not be read");
            }
        }
        errors
    }
}

/// Base repository trait for CRUD operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by ID
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<T>>;

    /// All entities, oldest first
    async fn find_all(&self) -> RepositoryResult<Vec<T>>;

    /// Count all entities
    async fn count(&self) -> RepositoryResult<i64>;

    /// Insert a new entity; the returned copy carries id and timestamps
    async fn create(&self, entity: T) -> RepositoryResult<T>;

    /// Replace a stored entity
    async fn update(&self, entity: T) -> RepositoryResult<T>;

    /// Delete an entity by ID
    async fn delete(&self, id: Id) -> RepositoryResult<()>;

    /// Check if an entity exists
    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// Projects. Deleting one that other records reference is a `Conflict`.
pub trait ProjectRepository: Repository<Project> {}

#[async_trait]
pub trait EstimationRepository: Repository<Estimation> {
    /// All versions for a project, by version
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Vec<Estimation>>;
}

#[async_trait]
pub trait DiscountPolicyRepository: Send + Sync {
    async fn find_by_role(&self, role: Role) -> RepositoryResult<Option<DiscountPolicy>>;
    async fn find_all(&self) -> RepositoryResult<Vec<DiscountPolicy>>;
    async fn upsert(&self, policy: DiscountPolicy) -> RepositoryResult<DiscountPolicy>;
}

#[async_trait]
pub trait QuotationRepository: Repository<Quotation> {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Vec<Quotation>>;
}

#[async_trait]
pub trait SalesOrderRepository: Repository<SalesOrder> {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Option<SalesOrder>>;
}

#[async_trait]
pub trait UserRepository: Repository<UserAccount> {
    async fn find_by_login(&self, login: &str) -> RepositoryResult<Option<UserAccount>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::error::FailureKind;

    #[test]
    fn test_repository_error_kinds() {
        let errors: ValidationErrors = RepositoryError::Conflict("project has estimations".into()).into();
        assert_eq!(errors.kind, FailureKind::Conflict);
        assert_eq!(errors.first_message().as_deref(), Some("project has estimations"));

        let errors: ValidationErrors = RepositoryError::NotFound("Project 4".into()).into();
        assert_eq!(errors.kind, FailureKind::NotFound);

        let errors: ValidationErrors = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(errors.kind, FailureKind::Internal);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            RepositoryError::from(sqlx::Error::RowNotFound),
            RepositoryError::NotFound(_)
        ));
    }
}
