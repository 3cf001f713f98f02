//! Journal Service
//!
//! Records journal entries and reads them back as a deal's history.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sf_core::traits::Id;
use thiserror::Error;

use crate::journal::{Journal, JournalType};

/// Journal service errors
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Journal not found: {0}")]
    NotFound(Id),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type JournalResult<T> = Result<T, JournalError>;

/// Event emitted when a journal is created
#[derive(Debug, Clone)]
pub struct JournalEvent {
    pub journal: Journal,
    pub timestamp: DateTime<Utc>,
}

/// Journal store trait for persistence
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Create a new journal entry
    async fn create(&self, journal: &Journal) -> JournalResult<Id>;

    /// Get a journal by ID
    async fn get(&self, id: Id) -> JournalResult<Option<Journal>>;

    /// All journals of a deal, oldest first
    async fn get_for_project(&self, project_id: Id) -> JournalResult<Vec<Journal>>;

    /// All journals of one record, oldest first
    async fn get_for_entity(
        &self,
        journable_type: JournalType,
        journable_id: Id,
    ) -> JournalResult<Vec<Journal>>;
}

/// Journal service for managing journals
pub struct JournalService {
    store: Arc<dyn JournalStore>,
    event_handlers: Vec<Box<dyn Fn(&JournalEvent) + Send + Sync>>,
}

impl JournalService {
    pub fn new(store: Arc<dyn JournalStore>) -> Self {
        Self {
            store,
            event_handlers: Vec::new(),
        }
    }

    /// Service backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryJournalStore::new()))
    }

    /// Register an event handler
    pub fn on_journal_created<F>(&mut self, handler: F)
    where
        F: Fn(&JournalEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Box::new(handler));
    }

    /// Persist a journal entry and notify handlers
    pub async fn record(&self, mut journal: Journal) -> JournalResult<Journal> {
        let id = self.store.create(&journal).await?;
        journal.id = Some(id);

        tracing::debug!(
            journal_id = id,
            project_id = journal.project_id,
            entity = journal.journable_type.as_str(),
            action = journal.action.as_str(),
            "journal recorded"
        );

        let event = JournalEvent {
            journal: journal.clone(),
            timestamp: Utc::now(),
        };
        self.emit_event(&event);

        Ok(journal)
    }

    /// History of a deal across all of its records
    pub async fn project_history(&self, project_id: Id) -> JournalResult<Vec<Journal>> {
        self.store.get_for_project(project_id).await
    }

    /// History of one record
    pub async fn get_history(
        &self,
        journable_type: JournalType,
        journable_id: Id,
    ) -> JournalResult<Vec<Journal>> {
        self.store.get_for_entity(journable_type, journable_id).await
    }

    pub async fn get_journal(&self, id: Id) -> JournalResult<Journal> {
        self.store
            .get(id)
            .await?
            .ok_or(JournalError::NotFound(id))
    }

    fn emit_event(&self, event: &JournalEvent) {
        for handler in &self.event_handlers {
            handler(event);
        }
    }
}

/// In-memory journal store
pub struct MemoryJournalStore {
    journals: RwLock<Vec<Journal>>,
    next_id: AtomicI64,
}

impl Default for MemoryJournalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self {
            journals: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl JournalStore for MemoryJournalStore {
    async fn create(&self, journal: &Journal) -> JournalResult<Id> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut journal = journal.clone();
        journal.id = Some(id);
        self.journals.write().push(journal);
        Ok(id)
    }

    async fn get(&self, id: Id) -> JournalResult<Option<Journal>> {
        Ok(self
            .journals
            .read()
            .iter()
            .find(|j| j.id == Some(id))
            .cloned())
    }

    async fn get_for_project(&self, project_id: Id) -> JournalResult<Vec<Journal>> {
        Ok(self
            .journals
            .read()
            .iter()
            .filter(|j| j.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_for_entity(
        &self,
        journable_type: JournalType,
        journable_id: Id,
    ) -> JournalResult<Vec<Journal>> {
        Ok(self
            .journals
            .read()
            .iter()
            .filter(|j| j.journable_type == journable_type && j.journable_id == journable_id)
            .cloned()
            .collect())
    }
}
