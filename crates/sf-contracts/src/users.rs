//! User account contracts

use once_cell::sync::Lazy;
use regex::Regex;
use sf_core::error::ValidationErrors;
use sf_models::{permissions, UserAccount};
use validator::Validate;

use crate::base::{merge_model_errors, require_permission, Contract, UserContext, ValidationResult};

/// Lowercase letters, digits, dots, dashes and underscores
static LOGIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]{1,62}$").unwrap());

/// An account to create together with its clear-text password
pub struct NewUser<'u> {
    pub account: &'u UserAccount,
    pub password: &'u str,
}

pub struct CreateUserContract<'a, U: UserContext> {
    user: &'a U,
    password_min_length: usize,
}

impl<'a, U: UserContext> CreateUserContract<'a, U> {
    pub fn new(user: &'a U, password_min_length: usize) -> Self {
        Self {
            user,
            password_min_length,
        }
    }

    fn validate_login(login: &str, errors: &mut ValidationErrors) {
        if !LOGIN_PATTERN.is_match(login) {
            errors.add(
                "login",
                "must be 2-63 characters of lowercase letters, digits, '.', '-' or '_'",
            );
        }
    }
}

impl<'a, 'u, U: UserContext> Contract<NewUser<'u>> for CreateUserContract<'a, U> {
    fn validate(&self, new_user: &NewUser<'u>) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        require_permission(self.user, permissions::MANAGE_USERS, "manage users", &mut errors);

        Self::validate_login(&new_user.account.login, &mut errors);
        if let Err(model_errors) = new_user.account.validate() {
            merge_model_errors(model_errors, &mut errors);
        }
        if new_user.account.roles.is_empty() {
            errors.add("roles", "must include at least one role");
        }
        if new_user.password.chars().count() < self.password_min_length {
            errors.add(
                "password",
                format!("is too short (minimum is {} characters)", self.password_min_length),
            );
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::traits::Id;
    use sf_models::Role;

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

    #[test]
    fn test_admin_creates_user() {
        let admin = MockUser {
            roles: vec![Role::Admin],
        };
        let account = UserAccount::new("m.keller", "m.keller@example.com", vec![Role::Sales]);
        let contract = CreateUserContract::new(&admin, 10);
        assert!(contract
            .validate(&NewUser {
                account: &account,
                password: "correct horse battery",
            })
            .is_ok());
    }

    #[test]
    fn test_rules() {
        let admin = MockUser {
            roles: vec![Role::Admin],
        };
        let account = UserAccount::new("Bad Login", "nope", vec![]);
        let errors = CreateUserContract::new(&admin, 10)
            .validate(&NewUser {
                account: &account,
                password: "short",
            })
            .unwrap_err();
        assert!(errors.has_error("login"));
        assert!(errors.has_error("email"));
        assert!(errors.has_error("roles"));
        assert!(errors.has_error("password"));
    }

    #[test]
    fn test_sales_cannot_create_users() {
        let sales = MockUser {
            roles: vec![Role::Sales],
        };
        let account = UserAccount::new("m.keller", "m.keller@example.com", vec![Role::Sales]);
        assert!(CreateUserContract::new(&sales, 10)
            .validate(&NewUser {
                account: &account,
                password: "correct horse battery",
            })
            .is_err());
    }
}
