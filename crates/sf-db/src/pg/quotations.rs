//! Quotation repository
//!
//! The number is derived from the id, so it is reserved from the sequence
//! before the insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sf_core::traits::Id;
use sf_models::{Quotation, QuotationLine};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::require_id;
use crate::repository::{QuotationRepository, Repository, RepositoryError, RepositoryResult};

const COLUMNS: &str = "id, number, project_id, estimation_id, estimation_version, customer_name, \
                       lines, subtotal, discount_percent, discount_amount, total, generated_by, \
                       generated_at";

#[derive(Debug, Clone, FromRow)]
pub struct QuotationRow {
    pub id: i64,
    pub number: String,
    pub project_id: i64,
    pub estimation_id: i64,
    pub estimation_version: i32,
    pub customer_name: String,
    pub lines: Json<Vec<QuotationLine>>,
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub total: f64,
    pub generated_by: i64,
    pub generated_at: DateTime<Utc>,
}

impl From<QuotationRow> for Quotation {
    fn from(row: QuotationRow) -> Self {
        Quotation {
            id: Some(row.id),
            number: row.number,
            project_id: row.project_id,
            estimation_id: row.estimation_id,
            estimation_version: row.estimation_version,
            customer_name: row.customer_name,
            lines: row.lines.0,
            subtotal: row.subtotal,
            discount_percent: row.discount_percent,
            discount_amount: row.discount_amount,
            total: row.total,
            generated_by: row.generated_by,
            generated_at: row.generated_at,
        }
    }
}

pub struct PgQuotationRepository {
    pool: PgPool,
}

impl PgQuotationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Quotation> for PgQuotationRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Quotation>> {
        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {COLUMNS} FROM quotations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quotation::from))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Quotation>> {
        let rows = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {COLUMNS} FROM quotations ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quotation::from).collect())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quotations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, quotation: Quotation) -> RepositoryResult<Quotation> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT nextval(pg_get_serial_sequence('quotations', 'id'))",
        )
        .fetch_one(&self.pool)
        .await?;
        let number = Quotation::format_number(quotation.generated_at, id);

        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            r#"
            INSERT INTO quotations (
                id, number, project_id, estimation_id, estimation_version, customer_name,
                lines, subtotal, discount_percent, discount_amount, total, generated_by,
                generated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            )
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&number)
        .bind(quotation.project_id)
        .bind(quotation.estimation_id)
        .bind(quotation.estimation_version)
        .bind(&quotation.customer_name)
        .bind(Json(&quotation.lines))
        .bind(quotation.subtotal)
        .bind(quotation.discount_percent)
        .bind(quotation.discount_amount)
        .bind(quotation.total)
        .bind(quotation.generated_by)
        .bind(quotation.generated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Quotation::from(row))
    }

    /// Quotations are immutable once generated
    async fn update(&self, quotation: Quotation) -> RepositoryResult<Quotation> {
        let id = require_id(quotation.id, "Quotation")?;
        Err(RepositoryError::Validation(format!(
            "Quotation {} cannot be changed",
            id
        )))
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM quotations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Quotation with id {} not found",
                id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl QuotationRepository for PgQuotationRepository {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Vec<Quotation>> {
        let rows = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {COLUMNS} FROM quotations WHERE project_id = $1 ORDER BY id ASC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quotation::from).collect())
    }
}
