//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated base URL for the backend API.
///
/// The URL must use the `http` or `https` scheme and name a host. A trailing
/// slash is stripped so paths can be joined without doubling separators.
///
/// # Example
///
/// ```rust
/// use dokumen_api::BaseUrl;
///
/// let url = BaseUrl::new("https://api.example.com/api/").unwrap();
/// assert_eq!(url.as_ref(), "https://api.example.com/api");
/// assert_eq!(url.host_name(), "api.example.com");
/// assert_eq!(url.join("/auth/login"), "https://api.example.com/api/auth/login");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidBaseUrl { url: url.clone() })?;

        let scheme = url[..scheme_end].to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_start >= host_end || url.contains(['?', '#']) {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Joins a request path onto this base URL.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated name for the session context header.
///
/// The context value (the active fiscal year) travels on every request under
/// this header name.
///
/// # Example
///
/// ```rust
/// use dokumen_api::ContextHeader;
///
/// let header = ContextHeader::new("X-Tahun-Anggaran").unwrap();
/// assert_eq!(header.as_ref(), "X-Tahun-Anggaran");
/// assert!(ContextHeader::new("X Tahun").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextHeader(String);

impl ContextHeader {
    /// Header used by the document backend for the fiscal-year selector.
    pub const DEFAULT: &'static str = "X-Tahun-Anggaran";

    /// Creates a new validated header name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeaderName`] if the name is empty or
    /// contains characters outside the HTTP token set.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() || !name.chars().all(Self::is_token_char) {
            return Err(ConfigError::InvalidHeaderName { name });
        }
        Ok(Self(name))
    }

    const fn is_token_char(c: char) -> bool {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
            )
    }
}

impl Default for ContextHeader {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl AsRef<str> for ContextHeader {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
