//! Project (opportunity) model
//!
//! Table: projects

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sf_core::traits::{Entity, Id, Identifiable, Timestamped};
use sf_core::types::lenient_amount;
use validator::Validate;

use crate::stage::PipelineStage;

/// Project priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(crate::ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// A sales opportunity moving through the pipeline
///
/// Exactly one current stage at a time. Monetary fields are read leniently:
/// values that are not numbers become `None` and count as zero on the board.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(max = 255))]
    #[serde(default)]
    pub customer_name: String,

    #[serde(default)]
    pub customer_id: Option<Id>,

    #[serde(default, deserialize_with = "lenient_amount")]
    pub estimated_value: Option<f64>,

    #[serde(default, deserialize_with = "lenient_amount")]
    pub contract_value: Option<f64>,

    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub lead_score: i32,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub expected_close_date: Option<NaiveDate>,

    pub stage: PipelineStage,

    pub sales_owner_id: Id,

    /// Set when the project is marked Lost
    #[serde(default)]
    pub lost_reason: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        customer_name: impl Into<String>,
        sales_owner_id: Id,
        stage: PipelineStage,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            customer_name: customer_name.into(),
            customer_id: None,
            estimated_value: None,
            contract_value: None,
            lead_score: 0,
            priority: Priority::default(),
            expected_close_date: None,
            stage,
            sales_owner_id,
            lost_reason: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Value counted in board column totals
    pub fn board_value(&self) -> f64 {
        self.contract_value
            .or(self.estimated_value)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn is_closed(&self) -> bool {
        self.stage.is_terminal()
    }
}

impl Identifiable for Project {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Project {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Project {
    const TABLE_NAME: &'static str = "projects";
    const TYPE_NAME: &'static str = "Project";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_board_value_prefers_contract_value() {
        let mut project = Project::new("ERP rollout", "Acme", 1, PipelineStage::Prospect);
        assert_eq!(project.board_value(), 0.0);

        project.estimated_value = Some(1200.0);
        assert_eq!(project.board_value(), 1200.0);

        project.contract_value = Some(1500.0);
        assert_eq!(project.board_value(), 1500.0);
    }

    #[test]
    fn test_non_numeric_values_count_as_zero() {
        let project: Project = serde_json::from_value(json!({
            "name": "Warehouse scanners",
            "stage": "PROSPECT",
            "salesOwnerId": 3,
            "estimatedValue": "call me",
            "contractValue": false
        }))
        .unwrap();

        assert_eq!(project.estimated_value, None);
        assert_eq!(project.board_value(), 0.0);
    }

    #[test]
    fn test_validation() {
        let mut project = Project::new("", "Acme", 1, PipelineStage::Prospect);
        assert!(project.validate().is_err());

        project.name = "Valid".into();
        project.lead_score = 101;
        assert!(project.validate().is_err());

        project.lead_score = 80;
        assert!(project.validate().is_ok());
    }
}
