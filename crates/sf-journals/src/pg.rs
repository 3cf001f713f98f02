//! PostgreSQL journal store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sf_core::traits::Id;
use sqlx::{FromRow, PgPool};

use crate::journal::{Journal, JournalAction, JournalType};
use crate::journal_service::{JournalError, JournalResult, JournalStore};

const COLUMNS: &str =
    "id, entity_type, entity_id, project_id, action, from_state, to_state, user_id, notes, created_at";

#[derive(Debug, Clone, FromRow)]
struct JournalRow {
    id: i64,
    entity_type: String,
    entity_id: i64,
    project_id: i64,
    action: String,
    from_state: Option<String>,
    to_state: Option<String>,
    user_id: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<JournalRow> for Journal {
    type Error = JournalError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        let journable_type = JournalType::parse(&row.entity_type).ok_or_else(|| {
            JournalError::InvalidData(format!("unknown entity type {}", row.entity_type))
        })?;
        let action = JournalAction::parse(&row.action)
            .ok_or_else(|| JournalError::InvalidData(format!("unknown action {}", row.action)))?;

        Ok(Journal {
            id: Some(row.id),
            journable_type,
            journable_id: row.entity_id,
            project_id: row.project_id,
            action,
            from_state: row.from_state,
            to_state: row.to_state,
            user_id: row.user_id,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn database_error(err: sqlx::Error) -> JournalError {
    JournalError::Database(err.to_string())
}

pub struct PgJournalStore {
    pool: PgPool,
}

impl PgJournalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JournalStore for PgJournalStore {
    async fn create(&self, journal: &Journal) -> JournalResult<Id> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO journals (
                entity_type, entity_id, project_id, action, from_state, to_state,
                user_id, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(journal.journable_type.as_str())
        .bind(journal.journable_id)
        .bind(journal.project_id)
        .bind(journal.action.as_str())
        .bind(&journal.from_state)
        .bind(&journal.to_state)
        .bind(journal.user_id)
        .bind(&journal.notes)
        .bind(journal.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }

    async fn get(&self, id: Id) -> JournalResult<Option<Journal>> {
        let row = sqlx::query_as::<_, JournalRow>(&format!(
            "SELECT {COLUMNS} FROM journals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(Journal::try_from).transpose()
    }

    async fn get_for_project(&self, project_id: Id) -> JournalResult<Vec<Journal>> {
        let rows = sqlx::query_as::<_, JournalRow>(&format!(
            "SELECT {COLUMNS} FROM journals WHERE project_id = $1 ORDER BY created_at, id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(Journal::try_from).collect()
    }

    async fn get_for_entity(
        &self,
        journable_type: JournalType,
        journable_id: Id,
    ) -> JournalResult<Vec<Journal>> {
        let rows = sqlx::query_as::<_, JournalRow>(&format!(
            "SELECT {COLUMNS} FROM journals WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY created_at, id"
        ))
        .bind(journable_type.as_str())
        .bind(journable_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(Journal::try_from).collect()
    }
}
