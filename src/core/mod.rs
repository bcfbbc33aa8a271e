//! Core types shared by every brewer module.
//!
//! Currently this is the error system:
//! - [`BrewerError`] - Enumerated error types covering all failure modes
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format

pub mod error;

pub use error::{BrewerError, ErrorContext, user_friendly_error};
