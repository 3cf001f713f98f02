//! Base contract system

use sf_core::error::ValidationErrors;
use sf_core::traits::Id;
use sf_models::Role;
use std::collections::HashSet;

pub use sf_core::result::ValidationResult;

/// The acting user, as seen by contracts
pub trait UserContext: Send + Sync {
    fn id(&self) -> Id;
    fn roles(&self) -> &[Role];

    fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Whether any of the user's roles grants `permission`
    fn allowed(&self, permission: &str) -> bool {
        self.roles().iter().any(|role| role.grants(permission))
    }
}

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;

    /// Check if an attribute is writable
    fn is_writable(&self, _attribute: &str) -> bool {
        true
    }
}

/// Record a permission failure unless `user` holds `permission`
pub fn require_permission<U: UserContext + ?Sized>(
    user: &U,
    permission: &str,
    action: &str,
    errors: &mut ValidationErrors,
) {
    if !user.allowed(permission) {
        errors.forbid(format!("You are not authorized to {action}"));
    }
}

/// Fold `validator` derive failures into contract errors
pub fn merge_model_errors(source: validator::ValidationErrors, errors: &mut ValidationErrors) {
    let mut fields: Vec<_> = source.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    for (field, failures) in fields {
        for failure in failures {
            let message = match &failure.message {
                Some(message) => message.to_string(),
                None => match &*failure.code {
                    "length" => "has an invalid length".to_string(),
                    "range" => "is out of range".to_string(),
                    "email" => "is not a valid email address".to_string(),
                    code => format!("is invalid ({code})"),
                },
            };
            errors.add(field, message);
        }
    }
}

/// Change tracking for update contracts
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    changed_attributes: HashSet<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_changed(&mut self, attribute: impl Into<String>) {
        self.changed_attributes.insert(attribute.into());
    }

    pub fn is_changed(&self, attribute: &str) -> bool {
        self.changed_attributes.contains(attribute)
    }

    pub fn changed_attributes(&self) -> &HashSet<String> {
        &self.changed_attributes
    }

    /// Reject every changed attribute the contract does not allow writing
    pub fn validate_writable<T, C: Contract<T> + ?Sized>(
        &self,
        contract: &C,
        errors: &mut ValidationErrors,
    ) {
        let mut changed: Vec<&String> = self.changed_attributes.iter().collect();
        changed.sort();
        for attribute in changed {
            if !contract.is_writable(attribute) {
                errors.add(attribute.as_str(), "is not writable");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::error::FailureKind;
    use sf_models::permissions;

    struct MockUser {
        roles: Vec<Role>,
    }

    impl UserContext for MockUser {
        fn id(&self) -> Id {
            1
        }
        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    struct ReadOnlyName;

    impl Contract<()> for ReadOnlyName {
        fn validate(&self, _entity: &()) -> ValidationResult {
            Ok(())
        }
        fn is_writable(&self, attribute: &str) -> bool {
            attribute != "name"
        }
    }

    #[test]
    fn test_change_tracker() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.is_changed("name"));

        tracker.mark_changed("name");
        tracker.mark_changed("priority");
        assert!(tracker.is_changed("name"));

        let mut errors = ValidationErrors::new();
        tracker.validate_writable::<(), _>(&ReadOnlyName, &mut errors);
        assert!(errors.has_error("name"));
        assert!(!errors.has_error("priority"));
    }

    #[test]
    fn test_require_permission() {
        let engineer = MockUser {
            roles: vec![Role::Engineering],
        };
        let mut errors = ValidationErrors::new();
        require_permission(&engineer, permissions::REQUEST_DISCOUNTS, "request discounts", &mut errors);
        assert_eq!(errors.kind, FailureKind::Forbidden);
        assert_eq!(
            errors.first_message().as_deref(),
            Some("You are not authorized to request discounts")
        );

        let mut errors = ValidationErrors::new();
        require_permission(&engineer, permissions::EDIT_ESTIMATIONS, "edit estimations", &mut errors);
        assert!(errors.is_empty());
    }
}
