//! Authentication and authorization services.
//!
//! The two layers are deliberately separate: [`token::TokenVerifier`]
//! answers "who is this", [`authorizer::RoleAuthorizer`] answers "may they",
//! and neither substitutes for the other.

pub mod authorizer;
pub mod token;

pub use authorizer::RoleAuthorizer;
pub use token::{Claims, TOKEN_LIFETIME_SECS, TokenVerifier};
