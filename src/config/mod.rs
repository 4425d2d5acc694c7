//! Configuration types for the API client.
//!
//! This module provides the configuration used to construct an
//! [`ApiClient`](crate::ApiClient).
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: The main configuration struct holding all client settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: A validated backend base URL
//! - [`ContextHeader`]: A validated header name for the session context value
//! - [`RefreshTokenPolicy`]: How to treat refresh responses without a new refresh token
//!
//! # Example
//!
//! ```rust
//! use dokumen_api::{BaseUrl, ClientConfig, RefreshTokenPolicy};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/api").unwrap())
//!     .refresh_token_policy(RefreshTokenPolicy::RequireRotation)
//!     .build()
//!     .unwrap();
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, ContextHeader};

use std::time::Duration;

use crate::error::ConfigError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Path prefix of the authentication endpoints.
pub const DEFAULT_AUTH_PATH_PREFIX: &str = "auth/";

/// Authentication endpoints whose 401s are returned as they are instead of
/// triggering a refresh. Other endpoints under the prefix (such as `me`)
/// refresh like any other request.
pub const REFRESH_EXEMPT_ENDPOINTS: [&str; 3] = ["login", "refresh", "logout"];

/// Request timeout used when none is configured.
///
/// Refreshed requests are replayed one after another, so this also bounds
/// how long a stalled replay can hold up the rest of the queue.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a refresh response does not carry a new refresh token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshTokenPolicy {
    /// Keep using the stored refresh token.
    #[default]
    KeepExisting,
    /// Treat the refresh as failed; the backend must rotate on every refresh.
    RequireRotation,
}

/// Configuration for the API client.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
///
/// # Example
///
/// ```rust
/// use dokumen_api::ClientConfig;
///
/// let config = ClientConfig::builder().build().unwrap();
/// assert_eq!(config.base_url().as_ref(), "http://localhost:8000/api");
/// assert_eq!(config.context_header().as_ref(), "X-Tahun-Anggaran");
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: BaseUrl,
    context_header: ContextHeader,
    auth_path_prefix: String,
    refresh_token_policy: RefreshTokenPolicy,
    user_agent_prefix: Option<String>,
    timeout: Duration,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the header name carrying the session context.
    #[must_use]
    pub const fn context_header(&self) -> &ContextHeader {
        &self.context_header
    }

    /// Returns the path prefix of authentication endpoints.
    #[must_use]
    pub fn auth_path_prefix(&self) -> &str {
        &self.auth_path_prefix
    }

    /// Returns the refresh token rotation policy.
    #[must_use]
    pub const fn refresh_token_policy(&self) -> RefreshTokenPolicy {
        self.refresh_token_policy
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` if `path` addresses one of the
    /// [`REFRESH_EXEMPT_ENDPOINTS`] under the auth prefix.
    ///
    /// A 401 from these endpoints is final; it never starts a refresh.
    #[must_use]
    pub fn is_auth_path(&self, path: &str) -> bool {
        path.trim_start_matches('/')
            .strip_prefix(self.auth_path_prefix.trim_end_matches('/'))
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|endpoint| endpoint.trim_end_matches('/'))
            .is_some_and(|endpoint| REFRESH_EXEMPT_ENDPOINTS.contains(&endpoint))
    }

    /// Returns the path of the authentication endpoint `endpoint`
    /// (`login`, `refresh`, `logout`, `me`) under the configured prefix.
    #[must_use]
    pub fn auth_path(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.auth_path_prefix.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// # Defaults
///
/// - `base_url`: [`DEFAULT_BASE_URL`]
/// - `context_header`: `X-Tahun-Anggaran`
/// - `auth_path_prefix`: [`DEFAULT_AUTH_PATH_PREFIX`]
/// - `refresh_token_policy`: [`RefreshTokenPolicy::KeepExisting`]
/// - `user_agent_prefix`: `None`
/// - `timeout`: [`DEFAULT_TIMEOUT`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<BaseUrl>,
    context_header: Option<ContextHeader>,
    auth_path_prefix: Option<String>,
    refresh_token_policy: Option<RefreshTokenPolicy>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend base URL.
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the header name carrying the session context.
    #[must_use]
    pub fn context_header(mut self, header: ContextHeader) -> Self {
        self.context_header = Some(header);
        self
    }

    /// Sets the path prefix of authentication endpoints.
    #[must_use]
    pub fn auth_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.auth_path_prefix = Some(prefix.into());
        self
    }

    /// Sets the refresh token rotation policy.
    #[must_use]
    pub const fn refresh_token_policy(mut self, policy: RefreshTokenPolicy) -> Self {
        self.refresh_token_policy = Some(policy);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the timeout applied to every request, including refresh calls
    /// and replays.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAuthPathPrefix`] if the auth path prefix
    /// is blank, or [`ConfigError::InvalidBaseUrl`] if the default base URL
    /// cannot be parsed.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => BaseUrl::new(DEFAULT_BASE_URL)?,
        };

        let auth_path_prefix = self
            .auth_path_prefix
            .unwrap_or_else(|| DEFAULT_AUTH_PATH_PREFIX.to_string());
        let auth_path_prefix = auth_path_prefix.trim().trim_start_matches('/').to_string();
        if auth_path_prefix.is_empty() {
            return Err(ConfigError::EmptyAuthPathPrefix);
        }

        Ok(ClientConfig {
            base_url,
            context_header: self.context_header.unwrap_or_default(),
            auth_path_prefix,
            refresh_token_policy: self.refresh_token_policy.unwrap_or_default(),
            user_agent_prefix: self.user_agent_prefix,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder().build().unwrap();

        assert_eq!(config.base_url().as_ref(), DEFAULT_BASE_URL);
        assert_eq!(config.context_header().as_ref(), ContextHeader::DEFAULT);
        assert_eq!(config.auth_path_prefix(), "auth/");
        assert_eq!(
            config.refresh_token_policy(),
            RefreshTokenPolicy::KeepExisting
        );
        assert!(config.user_agent_prefix().is_none());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builder_rejects_blank_auth_prefix() {
        let result = ClientConfig::builder().auth_path_prefix("  ").build();
        assert!(matches!(result, Err(ConfigError::EmptyAuthPathPrefix)));

        let result = ClientConfig::builder().auth_path_prefix("/").build();
        assert!(matches!(result, Err(ConfigError::EmptyAuthPathPrefix)));
    }

    #[test]
    fn test_is_auth_path_matches_exempt_endpoints_only() {
        let config = ClientConfig::builder().build().unwrap();

        assert!(config.is_auth_path("auth/login"));
        assert!(config.is_auth_path("/auth/refresh"));
        assert!(config.is_auth_path("auth/logout/"));
        assert!(!config.is_auth_path("auth/me"));
        assert!(!config.is_auth_path("auth/login/history"));
        assert!(!config.is_auth_path("dokumen"));
        assert!(!config.is_auth_path("users/auth/login"));
    }

    #[test]
    fn test_auth_path_joins_prefix_and_endpoint() {
        let config = ClientConfig::builder().build().unwrap();
        assert_eq!(config.auth_path("refresh"), "auth/refresh");
        assert!(config.is_auth_path(&config.auth_path("logout")));
        assert!(!config.is_auth_path(&config.auth_path("me")));

        let config = ClientConfig::builder()
            .auth_path_prefix("session")
            .build()
            .unwrap();
        assert_eq!(config.auth_path("/login"), "session/login");
        assert!(config.is_auth_path("session/login"));
        assert!(!config.is_auth_path("sessions/login"));
        assert!(!config.is_auth_path("sessionlogin"));
    }

    #[test]
    fn test_builder_with_all_optional_fields() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
            .context_header(ContextHeader::new("X-Fiscal-Year").unwrap())
            .auth_path_prefix("/session/")
            .refresh_token_policy(RefreshTokenPolicy::RequireRotation)
            .user_agent_prefix("Dashboard/2.0")
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        assert_eq!(config.base_url().host_name(), "api.example.com");
        assert_eq!(config.context_header().as_ref(), "X-Fiscal-Year");
        assert_eq!(config.auth_path_prefix(), "session/");
        assert!(config.is_auth_path("session/refresh"));
        assert_eq!(
            config.refresh_token_policy(),
            RefreshTokenPolicy::RequireRotation
        );
        assert_eq!(config.user_agent_prefix(), Some("Dashboard/2.0"));
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientConfig>();
    }
}
