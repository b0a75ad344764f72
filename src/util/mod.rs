//! Utility functions for common operations.
//!
//! - **URL handling**: validation of untrusted story links, source labels
//! - **Text processing**: Unicode-aware width, truncation and sanitising

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_to_width, wrap_to_width};
pub use url_validator::{source_label, validate_url, validate_url_for_open, UrlValidationError};
