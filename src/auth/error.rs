//! Error types for session operations.
//!
//! # Example
//!
//! ```rust
//! use dokumen_api::auth::SessionError;
//!
//! let error = SessionError::LoginRejected {
//!     message: "Invalid username or password".to_string(),
//! };
//! assert_eq!(error.to_string(), "Invalid username or password");
//! ```

use thiserror::Error;

use crate::clients::ApiError;

/// Errors returned by [`AuthSession`](crate::AuthSession).
///
/// # Thread Safety
///
/// `SessionError` is `Send + Sync`, making it safe to use across async boundaries.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend refused the login. The message is suitable for display.
    #[error("{message}")]
    LoginRejected {
        /// Message supplied by the backend.
        message: String,
    },

    /// The request could not be completed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Returns the message to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::LoginRejected { message } => message.clone(),
            Self::Api(ApiError::AuthEndpointRejected { message, .. }) => message.clone(),
            Self::Api(ApiError::Response(e)) => e.message.clone(),
            Self::Api(e) => e.to_string(),
        }
    }
}

// Verify SessionError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SessionError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpResponseError;

    #[test]
    fn test_user_message_uses_backend_text() {
        let error = SessionError::from(ApiError::AuthEndpointRejected {
            path: "auth/login".to_string(),
            code: 401,
            message: "Invalid username or password".to_string(),
        });
        assert_eq!(error.user_message(), "Invalid username or password");

        let error = SessionError::from(ApiError::from(HttpResponseError {
            code: 400,
            message: "Password is required".to_string(),
            error_reference: None,
        }));
        assert_eq!(error.user_message(), "Password is required");
    }

    #[test]
    fn test_api_error_is_transparent() {
        let error = SessionError::from(ApiError::InvalidResponse {
            message: "no token".to_string(),
        });
        assert_eq!(error.to_string(), "Invalid response: no token");
    }
}
