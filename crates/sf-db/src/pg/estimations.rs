//! Estimation repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sf_core::traits::Id;
use sf_models::{Estimation, LineItem};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::{parse_column, require_id};
use crate::repository::{EstimationRepository, Repository, RepositoryError, RepositoryResult};

const COLUMNS: &str = "id, project_id, version, status, technical_brief, attachments, line_items, \
                       requested_discount, approved_discount, requested_by, assigned_to, \
                       approved_by, created_by, discount_decided_at, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct EstimationRow {
    pub id: i64,
    pub project_id: i64,
    pub version: i32,
    pub status: String,
    pub technical_brief: String,
    pub attachments: Json<Vec<String>>,
    pub line_items: Json<Vec<LineItem>>,
    pub requested_discount: Option<f64>,
    pub approved_discount: Option<f64>,
    pub requested_by: Option<i64>,
    pub assigned_to: Option<i64>,
    pub approved_by: Option<i64>,
    pub created_by: i64,
    pub discount_decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EstimationRow> for Estimation {
    type Error = RepositoryError;

    fn try_from(row: EstimationRow) -> Result<Self, Self::Error> {
        Ok(Estimation {
            id: Some(row.id),
            project_id: row.project_id,
            version: row.version,
            status: parse_column("estimations.status", &row.status)?,
            technical_brief: row.technical_brief,
            attachments: row.attachments.0,
            line_items: row.line_items.0,
            requested_discount: row.requested_discount,
            approved_discount: row.approved_discount,
            requested_by: row.requested_by,
            assigned_to: row.assigned_to,
            approved_by: row.approved_by,
            created_by: row.created_by,
            discount_decided_at: row.discount_decided_at,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

pub struct PgEstimationRepository {
    pool: PgPool,
}

impl PgEstimationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Estimation> for PgEstimationRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Estimation>> {
        let row = sqlx::query_as::<_, EstimationRow>(&format!(
            "SELECT {COLUMNS} FROM estimations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Estimation::try_from).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Estimation>> {
        let rows = sqlx::query_as::<_, EstimationRow>(&format!(
            "SELECT {COLUMNS} FROM estimations ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Estimation::try_from).collect()
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM estimations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, estimation: Estimation) -> RepositoryResult<Estimation> {
        let row = sqlx::query_as::<_, EstimationRow>(&format!(
            r#"
            INSERT INTO estimations (
                project_id, version, status, technical_brief, attachments, line_items,
                requested_discount, approved_discount, requested_by, assigned_to,
                approved_by, created_by, discount_decided_at, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW()
            )
            RETURNING {COLUMNS}
            "#
        ))
        .bind(estimation.project_id)
        .bind(estimation.version)
        .bind(estimation.status.as_str())
        .bind(&estimation.technical_brief)
        .bind(Json(&estimation.attachments))
        .bind(Json(&estimation.line_items))
        .bind(estimation.requested_discount)
        .bind(estimation.approved_discount)
        .bind(estimation.requested_by)
        .bind(estimation.assigned_to)
        .bind(estimation.approved_by)
        .bind(estimation.created_by)
        .bind(estimation.discount_decided_at)
        .fetch_one(&self.pool)
        .await?;

        Estimation::try_from(row)
    }

    async fn update(&self, estimation: Estimation) -> RepositoryResult<Estimation> {
        let id = require_id(estimation.id, "Estimation")?;
        let row = sqlx::query_as::<_, EstimationRow>(&format!(
            r#"
            UPDATE estimations SET
                status = $1,
                technical_brief = $2,
                attachments = $3,
                line_items = $4,
                requested_discount = $5,
                approved_discount = $6,
                requested_by = $7,
                assigned_to = $8,
                approved_by = $9,
                discount_decided_at = $10,
                updated_at = NOW()
            WHERE id = $11
            RETURNING {COLUMNS}
            "#
        ))
        .bind(estimation.status.as_str())
        .bind(&estimation.technical_brief)
        .bind(Json(&estimation.attachments))
        .bind(Json(&estimation.line_items))
        .bind(estimation.requested_discount)
        .bind(estimation.approved_discount)
        .bind(estimation.requested_by)
        .bind(estimation.assigned_to)
        .bind(estimation.approved_by)
        .bind(estimation.discount_decided_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Estimation with id {} not found", id)))?;

        Estimation::try_from(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM estimations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Estimation with id {} not found",
                id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl EstimationRepository for PgEstimationRepository {
    async fn find_by_project(&self, project_id: Id) -> RepositoryResult<Vec<Estimation>> {
        let rows = sqlx::query_as::<_, EstimationRow>(&format!(
            "SELECT {COLUMNS} FROM estimations WHERE project_id = $1 ORDER BY version ASC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Estimation::try_from).collect()
    }
}
