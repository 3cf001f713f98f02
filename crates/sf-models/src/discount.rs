//! Discount policy model
//!
//! Table: discount_policies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sf_core::error::ValidationErrors;
use sf_core::types::is_valid_percent;
use std::str::FromStr;

use crate::role::Role;
use crate::ParseEnumError;

/// Per-role discount limits, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPolicy {
    pub role: Role,
    /// Highest discount the role may grant without escalation
    pub authority_limit: f64,
    /// Highest discount that may be requested at all
    pub max_limit: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Where a requested percentage falls relative to a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountClass {
    WithinAuthority,
    NeedsApproval,
    ExceedsMax,
}

impl DiscountPolicy {
    pub fn new(role: Role, authority_limit: f64, max_limit: f64) -> Self {
        Self {
            role,
            authority_limit,
            max_limit,
            updated_at: None,
        }
    }

    /// `0 <= authority_limit <= max_limit <= 100`
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !is_valid_percent(self.authority_limit) {
            errors.add("authority_limit", "must be between 0 and 100");
        }
        if !is_valid_percent(self.max_limit) {
            errors.add("max_limit", "must be between 0 and 100");
        }
        if errors.is_empty() && self.authority_limit > self.max_limit {
            errors.add("authority_limit", "must not exceed max_limit");
        }
        errors.into_result()
    }

    pub fn classify(&self, percent: f64) -> DiscountClass {
        if percent > self.max_limit {
            DiscountClass::ExceedsMax
        } else if percent > self.authority_limit {
            DiscountClass::NeedsApproval
        } else {
            DiscountClass::WithinAuthority
        }
    }

    /// Combine the policies of all of a user's roles.
    ///
    /// Each limit is the highest found across the given policies; `None` when
    /// the iterator is empty.
    pub fn most_permissive<'a>(
        policies: impl IntoIterator<Item = &'a DiscountPolicy>,
    ) -> Option<DiscountPolicy> {
        policies.into_iter().fold(None, |acc, policy| match acc {
            None => Some(policy.clone()),
            Some(mut best) => {
                if policy.authority_limit > best.authority_limit {
                    best.authority_limit = policy.authority_limit;
                    best.role = policy.role;
                }
                best.max_limit = best.max_limit.max(policy.max_limit);
                Some(best)
            }
        })
    }
}

/// CEO decision on an escalated discount request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountDecision {
    Approve,
    Reject,
}

impl DiscountDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountDecision::Approve => "APPROVE",
            DiscountDecision::Reject => "REJECT",
        }
    }
}

impl FromStr for DiscountDecision {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPROVE" | "APPROVED" => Ok(DiscountDecision::Approve),
            "REJECT" | "REJECTED" => Ok(DiscountDecision::Reject),
            _ => Err(ParseEnumError {
                kind: "discount decision",
                value: s.to_string(),
            }),
        }
    }
}
