//! Shared types and error helpers used across all streamify crates.

pub mod context;
pub mod types;

pub use context::FromMessage;
