//! Error types for scrollplay.
//!
//! This module defines the centralized error type [`ScrollplayError`] and a type alias
//! [`Result`] for the fallible edges of the crate: loading configuration and
//! validating key bindings. The navigation core itself never fails; missing elements
//! and empty playlists degrade to no-ops.

use thiserror::Error;

/// The main error type for scrollplay operations.
///
/// Most variants wrap underlying errors from external crates using `#[from]` for
/// automatic conversion.
///
/// # Examples
///
/// ```
/// use scrollplay::ScrollplayError;
///
/// fn validate() -> Result<(), ScrollplayError> {
///     Err(ScrollplayError::Config("key \"ArrowUp\" is bound twice".to_string()))
/// }
/// assert!(validate().is_err());
/// ```
#[derive(Debug, Error)]
pub enum ScrollplayError {
    /// Configuration is invalid.
    ///
    /// Occurs when key bindings conflict or a required value is blank. The string
    /// describes the specific configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or I/O operation failed.
    ///
    /// Wraps errors from reading a configuration file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for scrollplay operations.
pub type Result<T> = std::result::Result<T, ScrollplayError>;
