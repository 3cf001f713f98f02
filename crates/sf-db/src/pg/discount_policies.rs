//! Discount policy repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sf_models::{DiscountPolicy, Role};
use sqlx::{FromRow, PgPool};

use super::parse_column;
use crate::repository::{DiscountPolicyRepository, RepositoryError, RepositoryResult};

#[derive(Debug, Clone, FromRow)]
pub struct DiscountPolicyRow {
    pub role: String,
    pub authority_limit: f64,
    pub max_limit: f64,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DiscountPolicyRow> for DiscountPolicy {
    type Error = RepositoryError;

    fn try_from(row: DiscountPolicyRow) -> Result<Self, Self::Error> {
        Ok(DiscountPolicy {
            role: parse_column("discount_policies.role", &row.role)?,
            authority_limit: row.authority_limit,
            max_limit: row.max_limit,
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct PgDiscountPolicyRepository {
    pool: PgPool,
}

impl PgDiscountPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscountPolicyRepository for PgDiscountPolicyRepository {
    async fn find_by_role(&self, role: Role) -> RepositoryResult<Option<DiscountPolicy>> {
        let row = sqlx::query_as::<_, DiscountPolicyRow>(
            "SELECT role, authority_limit, max_limit, updated_at FROM discount_policies WHERE role = $1",
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DiscountPolicy::try_from).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<DiscountPolicy>> {
        let rows = sqlx::query_as::<_, DiscountPolicyRow>(
            "SELECT role, authority_limit, max_limit, updated_at FROM discount_policies ORDER BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DiscountPolicy::try_from).collect()
    }

    async fn upsert(&self, policy: DiscountPolicy) -> RepositoryResult<DiscountPolicy> {
        let row = sqlx::query_as::<_, DiscountPolicyRow>(
            r#"
            INSERT INTO discount_policies (role, authority_limit, max_limit, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (role) DO UPDATE SET
                authority_limit = EXCLUDED.authority_limit,
                max_limit = EXCLUDED.max_limit,
                updated_at = NOW()
            RETURNING role, authority_limit, max_limit, updated_at
            "#,
        )
        .bind(policy.role.as_str())
        .bind(policy.authority_limit)
        .bind(policy.max_limit)
        .fetch_one(&self.pool)
        .await?;

        DiscountPolicy::try_from(row)
    }
}
