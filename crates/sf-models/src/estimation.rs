//! Estimation model
//!
//! Table: estimations
//!
//! A versioned engineering costing document for a project. Engineering owns
//! the brief, attachments and line items; the discount fields are only
//! meaningful once the status has entered the discount sub-flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sf_core::traits::{Entity, Id, Identifiable, ProjectScoped, Timestamped};
use sf_core::types::round_money;
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimationStatus {
    Draft,
    Pending,
    InProgress,
    Approved,
    Rejected,
    Archived,
    PendingDiscountApproval,
    DiscountApproved,
    DiscountRejected,
}

impl EstimationStatus {
    pub const ALL: [EstimationStatus; 9] = [
        EstimationStatus::Draft,
        EstimationStatus::Pending,
        EstimationStatus::InProgress,
        EstimationStatus::Approved,
        EstimationStatus::Rejected,
        EstimationStatus::Archived,
        EstimationStatus::PendingDiscountApproval,
        EstimationStatus::DiscountApproved,
        EstimationStatus::DiscountRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstimationStatus::Draft => "DRAFT",
            EstimationStatus::Pending => "PENDING",
            EstimationStatus::InProgress => "IN_PROGRESS",
            EstimationStatus::Approved => "APPROVED",
            EstimationStatus::Rejected => "REJECTED",
            EstimationStatus::Archived => "ARCHIVED",
            EstimationStatus::PendingDiscountApproval => "PENDING_DISCOUNT_APPROVAL",
            EstimationStatus::DiscountApproved => "DISCOUNT_APPROVED",
            EstimationStatus::DiscountRejected => "DISCOUNT_REJECTED",
        }
    }

    /// Counts toward the one-active-estimation-per-project rule
    pub fn is_active(&self) -> bool {
        !matches!(self, EstimationStatus::Rejected | EstimationStatus::Archived)
    }

    pub fn in_discount_flow(&self) -> bool {
        matches!(
            self,
            EstimationStatus::PendingDiscountApproval
                | EstimationStatus::DiscountApproved
                | EstimationStatus::DiscountRejected
        )
    }

    /// Sales may (re)submit a discount request from these states
    pub fn accepts_discount_request(&self) -> bool {
        matches!(
            self,
            EstimationStatus::Approved | EstimationStatus::DiscountRejected
        )
    }

    /// A quotation may be generated from these states
    pub fn allows_quotation(&self) -> bool {
        matches!(
            self,
            EstimationStatus::Approved | EstimationStatus::DiscountApproved
        )
    }

    /// Transitions engineering may perform directly
    pub fn can_engineering_transition(&self, to: EstimationStatus) -> bool {
        use EstimationStatus::*;
        match (self, to) {
            (Draft, Pending) => true,
            (Pending, InProgress) | (Pending, Rejected) => true,
            (InProgress, Approved) | (InProgress, Rejected) => true,
            (from, Archived) => *from != Archived,
            _ => false,
        }
    }
}

impl fmt::Display for EstimationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EstimationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "estimation status",
                value: s.to_string(),
            })
    }
}

/// One costed line of an estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    pub fn amount(&self) -> f64 {
        round_money(self.quantity * self.unit_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimation {
    pub id: Option<Id>,
    pub project_id: Id,
    /// Per-project, starting at 1
    pub version: i32,
    pub status: EstimationStatus,
    pub technical_brief: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub requested_discount: Option<f64>,
    pub approved_discount: Option<f64>,
    pub requested_by: Option<Id>,
    pub assigned_to: Option<Id>,
    pub approved_by: Option<Id>,
    pub created_by: Id,
    pub discount_decided_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Estimation {
    pub fn new(project_id: Id, version: i32, technical_brief: impl Into<String>, created_by: Id) -> Self {
        Self {
            id: None,
            project_id,
            version,
            status: EstimationStatus::Pending,
            technical_brief: technical_brief.into(),
            attachments: Vec::new(),
            line_items: Vec::new(),
            requested_discount: None,
            approved_discount: None,
            requested_by: None,
            assigned_to: None,
            approved_by: None,
            created_by,
            discount_decided_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn subtotal(&self) -> f64 {
        round_money(self.line_items.iter().map(LineItem::amount).sum())
    }
}

impl Identifiable for Estimation {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Estimation {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl ProjectScoped for Estimation {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for Estimation {
    const TABLE_NAME: &'static str = "estimations";
    const TYPE_NAME: &'static str = "Estimation";
}

#[cfg(test)]
mod tests {
    use super::*;
    use EstimationStatus::*;

    #[test]
    fn test_engineering_transitions() {
        assert!(Pending.can_engineering_transition(InProgress));
        assert!(InProgress.can_engineering_transition(Approved));
        assert!(Approved.can_engineering_transition(Archived));
        assert!(!Pending.can_engineering_transition(Approved));
        assert!(!Approved.can_engineering_transition(DiscountApproved));
        assert!(!Archived.can_engineering_transition(Archived));
    }

    #[test]
    fn test_discount_gates() {
        assert!(Approved.accepts_discount_request());
        assert!(DiscountRejected.accepts_discount_request());
        assert!(!PendingDiscountApproval.accepts_discount_request());
        assert!(DiscountApproved.allows_quotation());
        assert!(!PendingDiscountApproval.allows_quotation());
    }

    #[test]
    fn test_status_round_trip_names() {
        assert_eq!(
            "pending_discount_approval".parse::<EstimationStatus>().unwrap(),
            PendingDiscountApproval
        );
        assert_eq!(
            serde_json::to_string(&DiscountRejected).unwrap(),
            "\"DISCOUNT_REJECTED\""
        );
    }

    #[test]
    fn test_subtotal() {
        let mut estimation = Estimation::new(1, 1, "Install 40 sensors", 2);
        estimation.line_items = vec![
            LineItem::new("Sensors", 40.0, 12.5),
            LineItem::new("Installation", 1.0, 800.0),
        ];
        assert_eq!(estimation.subtotal(), 1300.0);
    }
}
