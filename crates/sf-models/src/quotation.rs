//! Quotation model
//!
//! Table: quotations
//!
//! A priced document derived from an estimation and the discount in force
//! when it was generated. Rendering it to a file happens elsewhere.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sf_core::traits::{Entity, Id, Identifiable, ProjectScoped, Timestamped};
use sf_core::types::round_money;

use crate::estimation::Estimation;
use crate::project::Project;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Option<Id>,
    /// `QT-YYYY-NNNN`, assigned on insert
    pub number: String,
    pub project_id: Id,
    pub estimation_id: Id,
    pub estimation_version: i32,
    pub customer_name: String,
    pub lines: Vec<QuotationLine>,
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub total: f64,
    pub generated_by: Id,
    pub generated_at: DateTime<Utc>,
}

impl Quotation {
    /// Price an estimation.
    ///
    /// Uses the estimation's line items; when engineering has not costed any,
    /// a single line carries the project's estimated value.
    pub fn price(
        project: &Project,
        estimation: &Estimation,
        discount_percent: f64,
        generated_by: Id,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let lines: Vec<QuotationLine> = if estimation.line_items.is_empty() {
            let value = project.estimated_value.unwrap_or(0.0);
            vec![QuotationLine {
                description: project.name.clone(),
                quantity: 1.0,
                unit_price: value,
                amount: round_money(value),
            }]
        } else {
            estimation
                .line_items
                .iter()
                .map(|item| QuotationLine {
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    amount: item.amount(),
                })
                .collect()
        };

        let subtotal = round_money(lines.iter().map(|l| l.amount).sum());
        let discount_amount = round_money(subtotal * discount_percent / 100.0);

        Self {
            id: None,
            number: String::new(),
            project_id: project.id.unwrap_or_default(),
            estimation_id: estimation.id.unwrap_or_default(),
            estimation_version: estimation.version,
            customer_name: project.customer_name.clone(),
            lines,
            subtotal,
            discount_percent,
            discount_amount,
            total: round_money(subtotal - discount_amount),
            generated_by,
            generated_at,
        }
    }

    pub fn format_number(generated_at: DateTime<Utc>, sequence: i64) -> String {
        format!("QT-{}-{:04}", generated_at.year(), sequence)
    }
}

impl Identifiable for Quotation {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Quotation {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.generated_at)
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.generated_at)
    }
}

impl ProjectScoped for Quotation {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for Quotation {
    const TABLE_NAME: &'static str = "quotations";
    const TYPE_NAME: &'static str = "Quotation";
}
