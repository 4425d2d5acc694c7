//! The access/refresh credential pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The access/refresh token pair identifying an authenticated session.
///
/// Credentials are handed out by value: every read from a
/// [`CredentialStore`](crate::auth::CredentialStore) returns a fresh copy, so
/// no caller ever holds a reference into the store's state.
///
/// Holding an access token only means authentication is *possible*; the
/// backend confirms validity on the next authenticated call.
///
/// # Security
///
/// The `Debug` implementation masks both token values.
///
/// # Example
///
/// ```rust
/// use dokumen_api::Credential;
///
/// let credential = Credential::new("access-1", Some("refresh-1".to_string()));
/// assert_eq!(credential.access_token(), Some("access-1"));
/// assert_eq!(credential.refresh_token(), Some("refresh-1"));
/// assert!(!format!("{credential:?}").contains("access-1"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The bearer token attached to API requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// The token exchanged for a new access token on expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credential {
    /// Creates a credential from an access token and optional refresh token.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
        }
    }

    /// Returns the access token if it is present and non-empty.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns the refresh token if it is present and non-empty.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns `true` if neither token is usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token().is_none() && self.refresh_token().is_none()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |token: Option<&str>| token.map(|_| "*****");
        f.debug_struct("Credential")
            .field("access_token", &mask(self.access_token()))
            .field("refresh_token", &mask(self.refresh_token()))
            .finish()
    }
}
