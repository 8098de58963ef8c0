//! Result type alias for Registrar
//!
//! This module provides a convenient Result type alias that uses
//! `RegistrarError` as the error type.

use super::errors::RegistrarError;

/// Result type alias for Registrar operations
///
/// # Examples
///
/// ```
/// use registrar::domain::result::Result;
/// use registrar::domain::errors::RegistrarError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RegistrarError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RegistrarError>;
