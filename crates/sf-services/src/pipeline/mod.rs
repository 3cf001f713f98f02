//! Project and board services
//!
//! - create, edit and delete projects
//! - stage moves, including the optimistic board reducer
//! - read-only board summary

mod board;
mod create;
mod delete;
mod move_stage;
mod queries;
mod update;

pub use board::{
    BoardColumn, BoardMove, BoardService, BoardState, BoardSummary, MoveCommand, StageSummary,
};
pub use create::CreateProjectService;
pub use delete::{DeleteOutcome, DeleteProjectService, REMOVED_REASON};
pub use move_stage::MoveStageService;
pub(crate) use move_stage::persist_stage;
pub use queries::ProjectQueries;
pub use update::UpdateProjectService;

use chrono::NaiveDate;
use serde::Deserialize;
use sf_core::traits::Id;
use sf_core::types::lenient_amount;
use sf_models::{PipelineStage, Priority, Project};

/// Project service params
///
/// Absent fields are left unchanged on update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParams {
    pub name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_id: Option<Id>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub estimated_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub contract_value: Option<f64>,
    pub lead_score: Option<i32>,
    pub priority: Option<Priority>,
    pub expected_close_date: Option<NaiveDate>,
    pub sales_owner_id: Option<Id>,
    /// Only moves change the stage; a value here is reported as not writable
    pub stage: Option<PipelineStage>,
}

impl ProjectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_customer_name(mut self, customer_name: impl Into<String>) -> Self {
        self.customer_name = Some(customer_name.into());
        self
    }

    pub fn with_estimated_value(mut self, value: f64) -> Self {
        self.estimated_value = Some(value);
        self
    }

    pub fn with_contract_value(mut self, value: f64) -> Self {
        self.contract_value = Some(value);
        self
    }

    pub fn with_lead_score(mut self, lead_score: i32) -> Self {
        self.lead_score = Some(lead_score);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_sales_owner(mut self, sales_owner_id: Id) -> Self {
        self.sales_owner_id = Some(sales_owner_id);
        self
    }

    /// Copy every present field onto `project`; returns the changed attribute names
    pub(crate) fn apply(&self, project: &mut Project) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(name) = &self.name {
            project.name = name.trim().to_string();
            changed.push("name");
        }
        if let Some(customer_name) = &self.customer_name {
            project.customer_name = customer_name.trim().to_string();
            changed.push("customer_name");
        }
        if let Some(customer_id) = self.customer_id {
            project.customer_id = Some(customer_id);
            changed.push("customer_id");
        }
        if let Some(value) = self.estimated_value {
            project.estimated_value = Some(value);
            changed.push("estimated_value");
        }
        if let Some(value) = self.contract_value {
            project.contract_value = Some(value);
            changed.push("contract_value");
        }
        if let Some(lead_score) = self.lead_score {
            project.lead_score = lead_score;
            changed.push("lead_score");
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
            changed.push("priority");
        }
        if let Some(date) = self.expected_close_date {
            project.expected_close_date = Some(date);
            changed.push("expected_close_date");
        }
        if let Some(owner) = self.sales_owner_id {
            project.sales_owner_id = owner;
            changed.push("sales_owner_id");
        }
        changed
    }
}
