//! Quotation gate
//!
//! | discount vs policy            | estimation status | outcome                          |
//! |-------------------------------|-------------------|----------------------------------|
//! | <= authority limit            | Approved          | generate                         |
//! | authority < d <= max          | Approved          | blocked until Discount-Approved  |
//! | > max                         | any               | blocked                          |
//! | (ignored)                     | Discount-Approved | generate with the approved value |
//!
//! Also blocked when the project already has a proposal out or is closed.

use sf_core::error::{FailureKind, ValidationErrors};
use sf_core::types::is_valid_percent;
use sf_models::{
    permissions, DiscountClass, DiscountPolicy, Estimation, EstimationStatus, PipelineStage, Project,
};

use crate::base::{require_permission, UserContext};

/// Why a quotation cannot be generated
#[derive(Debug, Clone, PartialEq)]
pub enum GateBlock {
    ProposalAlreadyDelivered,
    ProjectClosed(PipelineStage),
    EstimationNotApproved(EstimationStatus),
    InvalidPercent(f64),
    NeedsApproval { percent: f64, authority_limit: f64 },
    ExceedsMax { percent: f64, max_limit: f64 },
}

impl GateBlock {
    pub fn message(&self) -> String {
        match self {
            GateBlock::ProposalAlreadyDelivered => {
                "A proposal has already been delivered for this project".to_string()
            }
            GateBlock::ProjectClosed(stage) => {
                format!("Project is closed as {}", stage.label())
            }
            GateBlock::EstimationNotApproved(status) => {
                format!("Quotations require an approved estimation (status is {status})")
            }
            GateBlock::InvalidPercent(_) => "Discount must be between 0 and 100".to_string(),
            GateBlock::NeedsApproval {
                percent,
                authority_limit,
            } => format!(
                "A discount of {percent}% exceeds your authority of {authority_limit}%; request approval first"
            ),
            GateBlock::ExceedsMax { percent, max_limit } => {
                format!("A discount of {percent}% exceeds the maximum allowed {max_limit}%")
            }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            GateBlock::ProposalAlreadyDelivered => FailureKind::Conflict,
            GateBlock::InvalidPercent(_) => FailureKind::Invalid,
            _ => FailureKind::BusinessRule,
        }
    }

    pub fn into_errors(self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match self.kind() {
            FailureKind::Invalid => errors.add("discount_percent", "must be between 0 and 100"),
            kind => errors.add_kind(kind, self.message()),
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuotationGate {
    /// Generate with this discount
    Allowed { percent: f64 },
    Blocked(GateBlock),
}

impl QuotationGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotationGate::Allowed { .. })
    }
}

/// Decide whether a quotation may be generated, and with which discount
pub fn quotation_gate(
    project: &Project,
    estimation: &Estimation,
    percent: f64,
    policy: &DiscountPolicy,
) -> QuotationGate {
    if project.stage == PipelineStage::ProposalDelivered {
        return QuotationGate::Blocked(GateBlock::ProposalAlreadyDelivered);
    }
    if project.stage.is_terminal() {
        return QuotationGate::Blocked(GateBlock::ProjectClosed(project.stage));
    }

    match estimation.status {
        EstimationStatus::DiscountApproved => QuotationGate::Allowed {
            percent: estimation.approved_discount.unwrap_or(0.0),
        },
        EstimationStatus::Approved => {
            if !is_valid_percent(percent) {
                return QuotationGate::Blocked(GateBlock::InvalidPercent(percent));
            }
            match policy.classify(percent) {
                DiscountClass::WithinAuthority => QuotationGate::Allowed { percent },
                DiscountClass::NeedsApproval => QuotationGate::Blocked(GateBlock::NeedsApproval {
                    percent,
                    authority_limit: policy.authority_limit,
                }),
                DiscountClass::ExceedsMax => QuotationGate::Blocked(GateBlock::ExceedsMax {
                    percent,
                    max_limit: policy.max_limit,
                }),
            }
        }
        status => {
            if policy.classify(percent) == DiscountClass::ExceedsMax {
                QuotationGate::Blocked(GateBlock::ExceedsMax {
                    percent,
                    max_limit: policy.max_limit,
                })
            } else {
                QuotationGate::Blocked(GateBlock::EstimationNotApproved(status))
            }
        }
    }
}

/// Permission plus gate; returns the discount to price with
pub struct GenerateQuotationContract<'a, U: UserContext> {
    user: &'a U,
    policy: &'a DiscountPolicy,
}

impl<'a, U: UserContext> GenerateQuotationContract<'a, U> {
    pub fn new(user: &'a U, policy: &'a DiscountPolicy) -> Self {
        Self { user, policy }
    }

    pub fn check(
        &self,
        project: &Project,
        estimation: &Estimation,
        percent: f64,
    ) -> Result<f64, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::GENERATE_QUOTATIONS, "generate quotations", &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        match quotation_gate(project, estimation, percent, self.policy) {
            QuotationGate::Allowed { percent } => Ok(percent),
            QuotationGate::Blocked(block) => Err(block.into_errors()),
        }
    }
}
