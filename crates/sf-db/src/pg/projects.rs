//! Project repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sf_core::traits::Id;
use sf_models::Project;
use sqlx::{FromRow, PgPool};

use super::{parse_column, require_id};
use crate::repository::{ProjectRepository, Repository, RepositoryError, RepositoryResult};

const COLUMNS: &str = "id, name, customer_name, customer_id, estimated_value, contract_value, \
                       lead_score, priority, expected_close_date, stage, sales_owner_id, \
                       lost_reason, created_at, updated_at";

/// Project database row
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub customer_name: String,
    pub customer_id: Option<i64>,
    pub estimated_value: Option<f64>,
    pub contract_value: Option<f64>,
    pub lead_score: i32,
    pub priority: String,
    pub expected_close_date: Option<NaiveDate>,
    pub stage: String,
    pub sales_owner_id: i64,
    pub lost_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = RepositoryError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: Some(row.id),
            name: row.name,
            customer_name: row.customer_name,
            customer_id: row.customer_id,
            estimated_value: row.estimated_value,
            contract_value: row.contract_value,
            lead_score: row.lead_score,
            priority: parse_column("projects.priority", &row.priority)?,
            expected_close_date: row.expected_close_date,
            stage: parse_column("projects.stage", &row.stage)?,
            sales_owner_id: row.sales_owner_id,
            lost_reason: row.lost_reason,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// Project repository implementation
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Project> for PgProjectRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Project::try_from).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {COLUMNS} FROM projects ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, project: Project) -> RepositoryResult<Project> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects (
                name, customer_name, customer_id, estimated_value, contract_value,
                lead_score, priority, expected_close_date, stage, sales_owner_id,
                lost_reason, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW()
            )
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&project.name)
        .bind(&project.customer_name)
        .bind(project.customer_id)
        .bind(project.estimated_value)
        .bind(project.contract_value)
        .bind(project.lead_score)
        .bind(project.priority.as_str())
        .bind(project.expected_close_date)
        .bind(project.stage.as_str())
        .bind(project.sales_owner_id)
        .bind(&project.lost_reason)
        .fetch_one(&self.pool)
        .await?;

        Project::try_from(row)
    }

    async fn update(&self, project: Project) -> RepositoryResult<Project> {
        let id = require_id(project.id, "Project")?;
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            UPDATE projects SET
                name = $1,
                customer_name = $2,
                customer_id = $3,
                estimated_value = $4,
                contract_value = $5,
                lead_score = $6,
                priority = $7,
                expected_close_date = $8,
                stage = $9,
                sales_owner_id = $10,
                lost_reason = $11,
                updated_at = NOW()
            WHERE id = $12
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&project.name)
        .bind(&project.customer_name)
        .bind(project.customer_id)
        .bind(project.estimated_value)
        .bind(project.contract_value)
        .bind(project.lead_score)
        .bind(project.priority.as_str())
        .bind(project.expected_close_date)
        .bind(project.stage.as_str())
        .bind(project.sales_owner_id)
        .bind(&project.lost_reason)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Project with id {} not found", id)))?;

        Project::try_from(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Project with id {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

impl ProjectRepository for PgProjectRepository {}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_models::{PipelineStage, Priority};

    fn row() -> ProjectRow {
        ProjectRow {
            id: 3,
            name: "Retail analytics".into(),
            customer_name: "Kaufhof".into(),
            customer_id: None,
            estimated_value: Some(12_000.0),
            contract_value: None,
            lead_score: 70,
            priority: "HIGH".into(),
            expected_close_date: None,
            stage: "PRE_SALES".into(),
            sales_owner_id: 2,
            lost_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_to_model() {
        let project = Project::try_from(row()).unwrap();
        assert_eq!(project.id, Some(3));
        assert_eq!(project.stage, PipelineStage::PreSales);
        assert_eq!(project.priority, Priority::High);
    }

    #[test]
    fn test_unknown_stage_is_invalid_data() {
        let mut bad = row();
        bad.stage = "NEGOTIATION".into();
        assert!(matches!(
            Project::try_from(bad),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
