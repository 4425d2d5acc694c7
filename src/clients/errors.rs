//! Error types for API requests.
//!
//! # Error Handling
//!
//! Every request made through [`ApiClient`](crate::ApiClient) returns
//! [`ApiError`] on failure. The variants map to how the failure should be
//! handled:
//!
//! - [`ApiError::Network`]: the request never reached the backend
//! - [`ApiError::Response`]: the backend answered with a non-2xx status
//! - [`ApiError::InvalidRequest`]: the request failed validation before sending
//! - [`ApiError::AuthEndpointRejected`]: login, refresh, logout or profile
//!   lookup was rejected
//! - [`ApiError::ReauthenticationRequired`]: the credential could not be
//!   refreshed; the session has been cleared
//! - [`ApiError::RetryExhausted`]: the request was rejected again after a
//!   refresh; the session has been cleared
//! - [`ApiError::InvalidResponse`]: a token payload could not be understood
//!
//! # Example
//!
//! ```rust,ignore
//! use dokumen_api::ApiError;
//!
//! match client.get("dokumen").await {
//!     Ok(response) => println!("{}", response.body),
//!     Err(e) if e.is_terminal() => {
//!         // Session is gone; send the user back to the login screen.
//!     }
//!     Err(ApiError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//!     Err(e) => println!("Request failed: {e}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when an HTTP request receives a non-successful response.
///
/// The message is taken from the response body's `error` or `message`
/// field when present, otherwise the raw body.
///
/// # Example
///
/// ```rust
/// use dokumen_api::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 404,
///     message: "Dokumen not found".to_string(),
///     error_reference: Some("abc-123".to_string()),
/// };
///
/// assert_eq!(error.to_string(), "Dokumen not found");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Error message extracted from the response.
    pub message: String,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned when an HTTP request fails validation.
///
/// # Example
///
/// ```rust
/// use dokumen_api::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::MissingBody {
///     method: "post".to_string(),
/// };
///
/// assert_eq!(error.to_string(), "Cannot use post without specifying data.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request path was empty.
    #[error("Request path cannot be empty.")]
    EmptyPath,
}

/// Unified error type for requests made through the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An authentication endpoint rejected the request.
    #[error("Authentication request to '{path}' was rejected ({code}): {message}")]
    AuthEndpointRejected {
        /// The request path.
        path: String,
        /// The HTTP status code.
        code: u16,
        /// Message supplied by the backend.
        message: String,
    },

    /// The credential could not be refreshed. The session has been cleared.
    #[error("Reauthentication required: {reason}")]
    ReauthenticationRequired {
        /// Why the refresh failed.
        reason: String,
    },

    /// The request was still unauthorized after one replay with a refreshed
    /// credential. The session has been cleared.
    #[error("Request to '{path}' was rejected again after refreshing credentials")]
    RetryExhausted {
        /// The request path.
        path: String,
    },

    /// A response body did not have the expected shape.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// What was wrong with the response.
        message: String,
    },
}

impl ApiError {
    /// Returns `true` for failures that cleared the session.
    ///
    /// Callers should route the user back to the login entry point.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ReauthenticationRequired { .. } | Self::RetryExhausted { .. }
        )
    }

    /// Returns the HTTP status code, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::AuthEndpointRejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_response_error_displays_message() {
        let error = HttpResponseError {
            code: 404,
            message: "Not Found".to_string(),
            error_reference: None,
        };
        assert_eq!(error.to_string(), "Not Found");
    }

    #[test]
    fn test_invalid_request_error_missing_body() {
        let error = InvalidHttpRequestError::MissingBody {
            method: "patch".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot use patch without specifying data."
        );
    }

    #[test]
    fn test_terminal_variants() {
        assert!(ApiError::ReauthenticationRequired {
            reason: "expired".to_string()
        }
        .is_terminal());
        assert!(ApiError::RetryExhausted {
            path: "dokumen".to_string()
        }
        .is_terminal());
        assert!(!ApiError::AuthEndpointRejected {
            path: "auth/login".to_string(),
            code: 401,
            message: "Invalid username or password".to_string(),
        }
        .is_terminal());
        assert!(!ApiError::from(InvalidHttpRequestError::EmptyPath).is_terminal());
    }

    #[test]
    fn test_status_reports_backend_codes() {
        let error = ApiError::from(HttpResponseError {
            code: 422,
            message: "bad".to_string(),
            error_reference: None,
        });
        assert_eq!(error.status(), Some(422));
        assert_eq!(
            ApiError::RetryExhausted {
                path: "x".to_string()
            }
            .status(),
            None
        );
    }

    #[test]
    fn test_error_types_implement_std_error() {
        let error: &dyn std::error::Error = &ApiError::InvalidResponse {
            message: "missing access_token".to_string(),
        };
        assert!(error.to_string().contains("missing access_token"));
    }
}
