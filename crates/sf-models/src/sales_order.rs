//! Sales order model
//!
//! Table: sales_orders

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sf_core::traits::{Entity, Id, Identifiable, ProjectScoped, Timestamped};

/// Payment terms offered on the Won dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum PaymentTerms {
    DueOnReceipt,
    #[serde(rename = "NET_15")]
    Net15,
    #[serde(rename = "NET_30")]
    Net30,
    #[serde(rename = "NET_45")]
    Net45,
    #[serde(rename = "NET_60")]
    Net60,
    #[serde(rename = "NET_90")]
    Net90,
    Custom { days: u16 },
}

impl PaymentTerms {
    pub const MAX_CUSTOM_DAYS: u16 = 365;

    pub fn days(&self) -> u16 {
        match self {
            PaymentTerms::DueOnReceipt => 0,
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::Net45 => 45,
            PaymentTerms::Net60 => 60,
            PaymentTerms::Net90 => 90,
            PaymentTerms::Custom { days } => *days,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            PaymentTerms::Custom { days } => (1..=Self::MAX_CUSTOM_DAYS).contains(days),
            _ => true,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PaymentTerms::DueOnReceipt => "Due on receipt".to_string(),
            PaymentTerms::Custom { days } => format!("Custom ({days} days)"),
            other => format!("Net {}", other.days()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: Option<Id>,
    /// `SO-YYYY-NNNN`, assigned on insert
    pub order_number: String,
    pub project_id: Id,
    pub customer_po_number: String,
    pub order_date: NaiveDate,
    pub payment_terms: PaymentTerms,
    pub contract_value: f64,
    /// Opaque reference to the uploaded PO document
    pub document_ref: String,
    pub created_by: Id,
    pub created_at: Option<DateTime<Utc>>,
}

impl SalesOrder {
    pub fn payment_terms_days(&self) -> u16 {
        self.payment_terms.days()
    }

    pub fn format_number(order_date: NaiveDate, sequence: i64) -> String {
        format!("SO-{}-{:04}", order_date.year(), sequence)
    }
}

impl Identifiable for SalesOrder {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for SalesOrder {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl ProjectScoped for SalesOrder {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for SalesOrder {
    const TABLE_NAME: &'static str = "sales_orders";
    const TYPE_NAME: &'static str = "SalesOrder";
}
