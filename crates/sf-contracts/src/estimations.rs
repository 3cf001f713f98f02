//! Estimation contracts
//!
//! Sales requests an estimation on a Pre-Sales project; engineering then owns
//! the brief, attachments, line items and the engineering part of the
//! status flow.

use sf_core::error::ValidationErrors;
use sf_models::{permissions, Estimation, EstimationStatus, LineItem, PipelineStage, Project};

use crate::base::{require_permission, Contract, UserContext, ValidationResult};

pub fn validate_brief(brief: &str, errors: &mut ValidationErrors) {
    if brief.trim().is_empty() {
        errors.add("technical_brief", "can't be blank");
    }
}

pub fn validate_attachments(attachments: &[String], errors: &mut ValidationErrors) {
    if attachments.iter().any(|a| a.trim().is_empty()) {
        errors.add("attachments", "must not contain empty references");
    }
}

pub fn validate_line_items(items: &[LineItem], errors: &mut ValidationErrors) {
    for (i, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            errors.add(format!("line_items[{i}].description"), "can't be blank");
        }
        if !(item.quantity.is_finite() && item.quantity > 0.0) {
            errors.add(format!("line_items[{i}].quantity"), "must be greater than 0");
        }
        if !(item.unit_price.is_finite() && item.unit_price >= 0.0) {
            errors.add(format!("line_items[{i}].unit_price"), "must not be negative");
        }
    }
}

/// Contract for requesting a new estimation on a project
pub struct CreateEstimationContract<'a, U: UserContext> {
    user: &'a U,
    project: &'a Project,
    existing: &'a [Estimation],
}

impl<'a, U: UserContext> CreateEstimationContract<'a, U> {
    pub fn new(user: &'a U, project: &'a Project, existing: &'a [Estimation]) -> Self {
        Self {
            user,
            project,
            existing,
        }
    }
}

impl<'a, U: UserContext> Contract<Estimation> for CreateEstimationContract<'a, U> {
    fn validate(&self, estimation: &Estimation) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::REQUEST_ESTIMATIONS, "request estimations", &mut errors);

        if self.project.stage != PipelineStage::PreSales {
            errors.reject(format!(
                "Estimations can only be requested in Pre-Sales (project is in {})",
                self.project.stage.label()
            ));
        }

        validate_brief(&estimation.technical_brief, &mut errors);
        validate_attachments(&estimation.attachments, &mut errors);

        if let Some(active) = self.existing.iter().find(|e| e.status.is_active()) {
            errors.conflict(format!(
                "Project already has an active estimation (version {})",
                active.version
            ));
        }

        errors.into_result()
    }
}

/// Contract for engineering edits.
///
/// Validates the updated estimation against the stored one.
pub struct UpdateEstimationContract<'a, U: UserContext> {
    user: &'a U,
    before: &'a Estimation,
}

impl<'a, U: UserContext> UpdateEstimationContract<'a, U> {
    pub fn new(user: &'a U, before: &'a Estimation) -> Self {
        Self { user, before }
    }

    fn validate_status_change(&self, to: EstimationStatus, errors: &mut ValidationErrors) {
        let from = self.before.status;
        if from == to {
            return;
        }
        if to.in_discount_flow() {
            errors.add("status", "can only be changed through the discount workflow");
        } else if !from.can_engineering_transition(to) {
            errors.reject(format!("Cannot change estimation status from {from} to {to}"));
        }
    }
}

impl<'a, U: UserContext> Contract<Estimation> for UpdateEstimationContract<'a, U> {
    fn validate(&self, after: &Estimation) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::EDIT_ESTIMATIONS, "edit estimations", &mut errors);

        if self.before.status == EstimationStatus::Archived {
            errors.reject("Archived estimations cannot be changed");
            return errors.into_result();
        }

        self.validate_status_change(after.status, &mut errors);
        validate_brief(&after.technical_brief, &mut errors);
        validate_attachments(&after.attachments, &mut errors);
        validate_line_items(&after.line_items, &mut errors);

        let costing_open = matches!(
            self.before.status,
            EstimationStatus::Draft | EstimationStatus::Pending | EstimationStatus::InProgress
        );
        if !costing_open && after.line_items != self.before.line_items {
            errors.reject("Line items are locked once the estimation is decided");
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "technical_brief" | "attachments" | "assigned_to" | "line_items" | "status"
        )
    }
}
