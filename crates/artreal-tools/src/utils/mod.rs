//! Shared helpers for tool implementations.

pub mod fs_errors;
pub mod path;
pub mod validation;
