//! Shared types and error helpers used across all snagbot crates.

pub mod error;
pub mod types;

pub use error::{UserError, user_error};
