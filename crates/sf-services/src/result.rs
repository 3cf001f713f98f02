//! Service Result type

use sf_core::error::{FailureKind, ValidationErrors};

/// Represents the result of a service call
#[derive(Debug)]
pub struct ServiceResult<T> {
    success: bool,
    result: Option<T>,
    errors: ValidationErrors,
}

impl<T> ServiceResult<T> {
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: ValidationErrors::new(),
        }
    }

    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            result: None,
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Execute closure if successful
    pub fn on_success<F>(self, f: F) -> Self
    where
        F: FnOnce(&T),
    {
        if self.success {
            if let Some(ref result) = self.result {
                f(result);
            }
        }
        self
    }

    /// Execute closure if failed
    pub fn on_failure<F>(self, f: F) -> Self
    where
        F: FnOnce(&ValidationErrors),
    {
        if !self.success {
            f(&self.errors);
        }
        self
    }

    /// Map the result if successful
    pub fn map<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ServiceResult {
            success: self.success,
            result: if self.success { self.result.map(f) } else { None },
            errors: self.errors,
        }
    }

    /// Convert into a plain `Result`
    pub fn into_result(self) -> Result<T, ValidationErrors> {
        self.into()
    }
}

impl<T> From<Result<T, ValidationErrors>> for ServiceResult<T> {
    fn from(result: Result<T, ValidationErrors>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(errors) => ServiceResult::failure(errors),
        }
    }
}

impl<T> From<ServiceResult<T>> for Result<T, ValidationErrors> {
    fn from(result: ServiceResult<T>) -> Self {
        if result.success {
            result.result.ok_or_else(|| {
                ValidationErrors::of_kind(
                    FailureKind::Internal,
                    "Service succeeded but no result was returned",
                )
            })
        } else {
            Err(result.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_reason() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add("reason", "can't be blank");
        errors
    }

    #[test]
    fn test_success_result() {
        let result = ServiceResult::success(42);
        assert!(result.is_success());
        assert_eq!(result.result(), Some(&42));
        assert_eq!(result.into_result().unwrap(), 42);
    }

    #[test]
    fn test_failure_result() {
        let result: ServiceResult<i32> = ServiceResult::failure(blank_reason());
        assert!(result.is_failure());
        assert!(result.result().is_none());
        assert!(result.errors().has_error("reason"));
    }

    #[test]
    fn test_map_keeps_failure() {
        let mapped = ServiceResult::success(21).map(|n| n * 2);
        assert_eq!(mapped.result(), Some(&42));

        let failed: ServiceResult<i32> = ServiceResult::failure(blank_reason());
        assert!(failed.map(|n| n * 2).is_failure());
    }

    #[test]
    fn test_callbacks() {
        let mut seen = None;
        ServiceResult::success(7).on_success(|n| seen = Some(*n));
        assert_eq!(seen, Some(7));

        let mut failed = false;
        ServiceResult::<()>::failure(blank_reason()).on_failure(|_| failed = true);
        assert!(failed);
    }

    #[test]
    fn test_result_conversion() {
        let mut errors = ValidationErrors::new();
        errors.conflict("already pending");
        let result: ServiceResult<()> = Err(errors).into();
        let errors = result.into_result().unwrap_err();
        assert_eq!(errors.kind, FailureKind::Conflict);
    }
}
