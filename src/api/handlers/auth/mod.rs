//! Authentication and authorization: token issuance, principal resolution,
//! and the role policy.

pub mod principal;
pub mod state;
pub mod token;
pub(crate) mod utils;

#[cfg(test)]
mod tests;

pub use state::{AuthConfig, AuthState};
