//! Estimation services

mod create;
mod queries;
mod update;

pub use create::CreateEstimationService;
pub use queries::EstimationQueries;
pub use update::UpdateEstimationService;

use serde::Deserialize;
use sf_core::traits::Id;
use sf_journals::{Journal, JournalAction, JournalType};
use sf_models::{Estimation, EstimationStatus, LineItem};

/// Request for a new estimation version
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEstimationParams {
    #[serde(default)]
    pub technical_brief: String,
    pub assigned_to: Option<Id>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NewEstimationParams {
    pub fn new(technical_brief: impl Into<String>) -> Self {
        Self {
            technical_brief: technical_brief.into(),
            ..Default::default()
        }
    }

    pub fn assigned_to(mut self, user_id: Id) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn with_attachment(mut self, reference: impl Into<String>) -> Self {
        self.attachments.push(reference.into());
        self
    }
}

/// Engineering edits; absent fields stay as they are
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationParams {
    pub technical_brief: Option<String>,
    pub attachments: Option<Vec<String>>,
    pub assigned_to: Option<Id>,
    pub line_items: Option<Vec<LineItem>>,
    pub status: Option<EstimationStatus>,
}

impl EstimationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: EstimationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.technical_brief = Some(brief.into());
        self
    }

    pub fn with_line_items(mut self, items: Vec<LineItem>) -> Self {
        self.line_items = Some(items);
        self
    }

    pub fn with_assignee(mut self, user_id: Id) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub(crate) fn apply(&self, estimation: &mut Estimation) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(brief) = &self.technical_brief {
            estimation.technical_brief = brief.clone();
            changed.push("technical_brief");
        }
        if let Some(attachments) = &self.attachments {
            estimation.attachments = attachments.clone();
            changed.push("attachments");
        }
        if let Some(assignee) = self.assigned_to {
            estimation.assigned_to = Some(assignee);
            changed.push("assigned_to");
        }
        if let Some(items) = &self.line_items {
            estimation.line_items = items.clone();
            changed.push("line_items");
        }
        if let Some(status) = self.status {
            estimation.status = status;
            changed.push("status");
        }
        changed
    }
}

/// Journal entry for a change to one estimation
pub(crate) fn estimation_journal(estimation: &Estimation, action: JournalAction, user_id: Id) -> Option<Journal> {
    estimation.id.map(|id| {
        Journal::new(JournalType::Estimation, id, estimation.project_id, action, user_id)
    })
}
