//! Core types for layerdeps
//!
//! This module holds the error taxonomy shared by every other module:
//! - [`LocalizeError`] - Enumerated error types for all failure cases
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error chain to a displayable context

pub mod error;

pub use error::{ErrorContext, LocalizeError, user_friendly_error};
