//! Result type aliases

use crate::error::{SfError, ValidationErrors};

/// Standard Result type for SalesFlow operations
pub type SfResult<T> = Result<T, SfError>;

/// Result of a contract check
pub type ValidationResult = Result<(), ValidationErrors>;
