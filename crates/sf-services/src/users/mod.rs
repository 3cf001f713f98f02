//! User accounts and sign-in

mod authenticate;
mod create;

pub use authenticate::{authenticate, seed_admin, UserQueries};
pub use create::{CreateUserService, NewUserParams};
