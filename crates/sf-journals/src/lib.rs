//! # sf-journals
//!
//! Audit trail for SalesFlow.
//!
//! Every transition of a project, an estimation, a quotation or a sales
//! order is journaled with who did it and the states on either side, so the
//! history of a deal can be read back per project.

pub mod journal;
pub mod journal_service;
pub mod pg;

pub use journal::{Journal, JournalAction, JournalType};
pub use journal_service::{
    JournalError, JournalEvent, JournalResult, JournalService, JournalStore, MemoryJournalStore,
};
pub use pg::PgJournalStore;
