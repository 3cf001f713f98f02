//! # sf-auth
//!
//! Authentication for SalesFlow.
//!
//! - JWT bearer tokens carrying the user's roles
//! - Argon2 password hashing
//! - [`CurrentUser`], the authenticated caller as contracts see it

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService};
pub use middleware::{AuthError, Authenticator};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::CurrentUser;
