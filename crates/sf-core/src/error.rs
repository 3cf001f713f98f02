//! Core error types for SalesFlow
//!
//! Every rejected command ends up as one of these, and the API maps them to
//! HTTP responses.

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all SalesFlow operations
#[derive(Error, Debug)]
pub enum SfError {
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error("Business rule violated: {message}")]
    BusinessRule { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a command was refused.
///
/// Ordered by precedence: when errors are merged the most severe kind wins,
/// so a permission failure is never reported as a plain field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FailureKind {
    #[default]
    Invalid,
    BusinessRule,
    Conflict,
    NotFound,
    Forbidden,
    /// Storage or other server-side failure
    Internal,
}

/// Validation errors collection
#[derive(Debug, Default, Clone)]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
    /// Most severe failure recorded so far
    pub kind: FailureKind,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    /// Record a base error and raise the failure kind
    pub fn add_kind(&mut self, kind: FailureKind, message: impl Into<String>) {
        self.add_base(message);
        self.raise(kind);
    }

    pub fn forbid(&mut self, message: impl Into<String>) {
        self.add_kind(FailureKind::Forbidden, message);
    }

    pub fn reject(&mut self, message: impl Into<String>) {
        self.add_kind(FailureKind::BusinessRule, message);
    }

    pub fn conflict(&mut self, message: impl Into<String>) {
        self.add_kind(FailureKind::Conflict, message);
    }

    pub fn not_found(&mut self, message: impl Into<String>) {
        self.add_kind(FailureKind::NotFound, message);
    }

    pub fn internal(&mut self, message: impl Into<String>) {
        self.add_kind(FailureKind::Internal, message);
    }

    /// Single base error of the given kind
    pub fn of_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add_kind(kind, message);
        errors
    }

    fn raise(&mut self, kind: FailureKind) {
        if kind > self.kind {
            self.kind = kind;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
        self.raise(other.kind);
    }

    /// Convert into `Err` when anything was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// First message, used as the user-facing summary
    pub fn first_message(&self) -> Option<String> {
        self.full_messages().into_iter().next()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Single contract failure, convertible into [`ValidationErrors`]
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Attribute {attribute} is invalid: {message}")]
    AttributeInvalid { attribute: String, message: String },

    #[error("Attribute {attribute} is not writable")]
    AttributeNotWritable { attribute: String },

    #[error("Base contract error: {message}")]
    Base { message: String },
}

impl From<ContractError> for ValidationErrors {
    fn from(err: ContractError) -> Self {
        let mut errors = ValidationErrors::new();
        match err {
            ContractError::AttributeInvalid { attribute, message } => {
                errors.add(attribute, message);
            }
            ContractError::AttributeNotWritable { attribute } => {
                errors.add(attribute, "is not writable");
            }
            ContractError::Base { message } => {
                errors.add_base(message);
            }
        }
        errors
    }
}

impl SfError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        SfError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            SfError::NotFound { .. } => 404,
            SfError::Unauthorized { .. } => 401,
            SfError::Forbidden { .. } => 403,
            SfError::Validation(errors) => match errors.kind {
                FailureKind::Invalid | FailureKind::BusinessRule => 422,
                FailureKind::Conflict => 409,
                FailureKind::NotFound => 404,
                FailureKind::Forbidden => 403,
                FailureKind::Internal => 500,
            },
            SfError::Contract(_) | SfError::BusinessRule { .. } => 422,
            SfError::Conflict { .. } => 409,
            SfError::Database(_) | SfError::Internal(_) | SfError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SfError::NotFound { .. } => "not_found",
            SfError::Unauthorized { .. } => "unauthorized",
            SfError::Forbidden { .. } => "forbidden",
            SfError::Validation(_) => "validation_failed",
            SfError::Contract(_) => "contract_violated",
            SfError::BusinessRule { .. } => "business_rule_violated",
            SfError::Conflict { .. } => "conflict",
            SfError::Database(_) => "database_error",
            SfError::Internal(_) => "internal_error",
            SfError::Config(_) => "configuration_error",
        }
    }
}
