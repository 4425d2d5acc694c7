//! Error types for client configuration.
//!
//! This module contains the error type used when building a
//! [`ClientConfig`](crate::ClientConfig) or one of its validated newtypes.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use dokumen_api::{BaseUrl, ConfigError};
//!
//! let result = BaseUrl::new("");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur during client configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide an http(s) URL with a host (e.g., 'https://api.example.com/api').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Header name is not a valid HTTP token.
    #[error("Invalid header name '{name}'. Header names must be non-empty and contain only visible ASCII without separators.")]
    InvalidHeaderName {
        /// The invalid header name that was provided.
        name: String,
    },

    /// The authentication path prefix is empty.
    #[error("Authentication path prefix cannot be empty. Use something like 'auth/'.")]
    EmptyAuthPathPrefix,

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
