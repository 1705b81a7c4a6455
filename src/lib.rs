//! Tribuna: user accounts, roles and session tokens over axum + Postgres.

pub mod api;
pub mod cli;
pub mod files;
