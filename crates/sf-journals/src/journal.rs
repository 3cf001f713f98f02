//! Journal model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sf_core::traits::Id;

/// What kind of record a journal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalType {
    Project,
    Estimation,
    Quotation,
    SalesOrder,
}

impl JournalType {
    /// Get the database type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Estimation => "Estimation",
            Self::Quotation => "Quotation",
            Self::SalesOrder => "SalesOrder",
        }
    }

    /// Parse from database type name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Project" => Some(Self::Project),
            "Estimation" => Some(Self::Estimation),
            "Quotation" => Some(Self::Quotation),
            "SalesOrder" => Some(Self::SalesOrder),
            _ => None,
        }
    }
}

/// The kind of change recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalAction {
    Created,
    Updated,
    StageChanged,
    StatusChanged,
    DiscountRequested,
    DiscountDecided,
    QuotationGenerated,
    SalesOrderCreated,
    MarkedLost,
    Deleted,
}

impl JournalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::StageChanged => "STAGE_CHANGED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::DiscountRequested => "DISCOUNT_REQUESTED",
            Self::DiscountDecided => "DISCOUNT_DECIDED",
            Self::QuotationGenerated => "QUOTATION_GENERATED",
            Self::SalesOrderCreated => "SALES_ORDER_CREATED",
            Self::MarkedLost => "MARKED_LOST",
            Self::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::Created,
            Self::Updated,
            Self::StageChanged,
            Self::StatusChanged,
            Self::DiscountRequested,
            Self::DiscountDecided,
            Self::QuotationGenerated,
            Self::SalesOrderCreated,
            Self::MarkedLost,
            Self::Deleted,
        ]
        .into_iter()
        .find(|action| action.as_str() == s)
    }
}

/// A journal entry (audit record)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: Option<Id>,
    pub journable_type: JournalType,
    pub journable_id: Id,
    /// Deal the record belongs to; history is read per project
    pub project_id: Id,
    pub action: JournalAction,
    /// State before the change, e.g. a stage or status wire name
    pub from_state: Option<String>,
    pub to_state: Option<String>,
    /// User who made the change
    pub user_id: Id,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Journal {
    pub fn new(
        journable_type: JournalType,
        journable_id: Id,
        project_id: Id,
        action: JournalAction,
        user_id: Id,
    ) -> Self {
        Self {
            id: None,
            journable_type,
            journable_id,
            project_id,
            action,
            from_state: None,
            to_state: None,
            user_id,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Journal for a project-level change
    pub fn project(project_id: Id, action: JournalAction, user_id: Id) -> Self {
        Self::new(JournalType::Project, project_id, project_id, action, user_id)
    }

    /// Record the states on either side of the change
    pub fn transition(mut self, from: impl ToString, to: impl ToString) -> Self {
        self.from_state = Some(from.to_string());
        self.to_state = Some(to.to_string());
        self
    }

    /// Record only the resulting state
    pub fn resulting_in(mut self, to: impl ToString) -> Self {
        self.to_state = Some(to.to_string());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_ref().map_or(false, |n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_journal() {
        let journal = Journal::project(4, JournalAction::StageChanged, 10)
            .transition("PRE_SALES", "PROPOSAL_DELIVERED");
        assert_eq!(journal.journable_type, JournalType::Project);
        assert_eq!(journal.journable_id, 4);
        assert_eq!(journal.project_id, 4);
        assert_eq!(journal.from_state.as_deref(), Some("PRE_SALES"));
        assert!(!journal.has_notes());
    }

    #[test]
    fn test_notes() {
        let journal = Journal::project(4, JournalAction::MarkedLost, 10).with_notes("  ");
        assert!(!journal.has_notes());
        let journal = journal.with_notes("Budget cut");
        assert!(journal.has_notes());
    }

    #[test]
    fn test_type_and_action_names() {
        assert_eq!(JournalType::parse("SalesOrder"), Some(JournalType::SalesOrder));
        assert_eq!(JournalType::parse("WorkItem"), None);
        assert_eq!(
            JournalAction::parse("DISCOUNT_DECIDED"),
            Some(JournalAction::DiscountDecided)
        );
        assert_eq!(
            serde_json::to_value(JournalAction::QuotationGenerated).unwrap(),
            "QUOTATION_GENERATED"
        );
    }
}
