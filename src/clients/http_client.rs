//! HTTP client for the document management backend.
//!
//! This module provides the [`ApiClient`] type for making authenticated
//! requests with transparent, single-flight credential refresh.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::auth::{Credential, CredentialStore};
use crate::clients::authenticator::RequestAuthenticator;
use crate::clients::errors::ApiError;
use crate::clients::events::{self, SessionEvent};
use crate::clients::http_request::{HttpMethod, HttpRequest, RetryableRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::refresh::{self, RefreshCoordinator};
use crate::config::{ClientConfig, RefreshTokenPolicy};

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for the backend API.
///
/// The client handles:
/// - URL construction from the configured base URL
/// - Default headers (`Accept`, `User-Agent`) plus the bearer token and
///   session context read from the [`CredentialStore`] on every request
/// - Refreshing an expired access token exactly once, however many requests
///   fail concurrently, and replaying the failed requests in arrival order
///
/// Requests are never retried for any other reason: network failures and
/// non-401 responses are returned to the caller as they are.
///
/// Replays after a refresh run one at a time, in arrival order, each bounded
/// by the configured [timeout](ClientConfig::timeout).
///
/// # Thread Safety
///
/// `ApiClient` is cheap to clone; clones share the credential store and the
/// refresh state. It is `Send + Sync`.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use dokumen_api::{ApiClient, ClientConfig, MemoryCredentialStore};
///
/// let store = Arc::new(MemoryCredentialStore::new());
/// let client = ApiClient::new(ClientConfig::builder().build()?, store)?;
///
/// let response = client.get("dokumen").await?;
/// println!("{}", response.data());
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    authenticator: RequestAuthenticator,
    default_headers: HashMap<String, String>,
    coordinator: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

/// How a response is handled.
enum Disposition {
    /// The caller gets this outcome.
    Settled(Result<HttpResponse, ApiError>),
    /// The credential expired; the request waits for a refresh.
    Unauthorized(RetryableRequest),
    /// The request carried a token that has since been replaced; it is
    /// replayed with the current one without refreshing again.
    Stale(RetryableRequest),
}

/// A response together with the access token its request carried.
struct Exchange {
    response: HttpResponse,
    sent_token: Option<String>,
}

/// How a refresh attempt ended.
#[derive(Debug)]
enum RefreshOutcome {
    /// The new credential was written.
    Refreshed,
    /// The refresh failed and the credential it started from was cleared.
    Failed(String),
    /// The credential changed while the refresh was in flight (a login or
    /// logout); the store was left alone.
    Superseded,
}

impl ApiClient {
    /// Creates a client reading credentials from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the underlying HTTP client cannot be
    /// created (for example, TLS initialization failure).
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use dokumen_api::{ApiClient, ClientConfig, MemoryCredentialStore};
    ///
    /// let config = ClientConfig::builder().user_agent_prefix("Dashboard/2.0").build().unwrap();
    /// let client = ApiClient::new(config, Arc::new(MemoryCredentialStore::new())).unwrap();
    ///
    /// assert!(!client.is_refreshing());
    /// assert!(client.user_agent().starts_with("Dashboard/2.0 | "));
    /// ```
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .build()?;

        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}dokumen-api-client v{SDK_VERSION}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        let authenticator =
            RequestAuthenticator::new(Arc::clone(&store), config.context_header().clone());

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                store,
                authenticator,
                default_headers,
                coordinator: RefreshCoordinator::new(),
                events: events::channel(),
            }),
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the credential store shared with this client.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Returns the `User-Agent` sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.inner
            .default_headers
            .get("User-Agent")
            .map_or("", String::as_str)
    }

    /// Returns `true` while a credential refresh is outstanding.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Returns how many requests are waiting for the current refresh.
    #[must_use]
    pub fn queued_requests(&self) -> usize {
        self.inner.coordinator.queued()
    }

    /// Subscribes to session lifecycle events.
    ///
    /// Only events published after subscribing are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Sends a request to the backend.
    ///
    /// When the backend answers `401 Unauthorized` for a request other than
    /// login, refresh or logout, the request is held while the credential is
    /// refreshed and then replayed once with the new access token. Concurrent
    /// 401s share a single refresh call, and a 401 for a token that an
    /// earlier refresh already replaced is replayed straight away.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - A network error occurs (`Network`)
    /// - A non-2xx response is received (`Response`)
    /// - Login, refresh or logout answers 401 (`AuthEndpointRejected`)
    /// - The credential cannot be refreshed (`ReauthenticationRequired`)
    /// - The replay is rejected again (`RetryExhausted`)
    ///
    /// The last two clear the credential store and publish
    /// [`SessionEvent::Expired`].
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        request.verify()?;

        let attempt = RetryableRequest::new(request);
        let exchange = self.inner.send_once(&attempt.request).await?;

        match self.inner.dispose(attempt, exchange) {
            Disposition::Settled(outcome) => outcome,
            Disposition::Unauthorized(attempt) => self.await_refresh(attempt).await,
            Disposition::Stale(attempt) => self.inner.replay(attempt).await,
        }
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.request(HttpRequest::builder(HttpMethod::Get, path).build()?)
            .await
    }

    /// Sends a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post(&self, path: &str, body: impl Into<Value>) -> Result<HttpResponse, ApiError> {
        self.request(HttpRequest::builder(HttpMethod::Post, path).body(body).build()?)
            .await
    }

    /// Sends a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put(&self, path: &str, body: impl Into<Value>) -> Result<HttpResponse, ApiError> {
        self.request(HttpRequest::builder(HttpMethod::Put, path).body(body).build()?)
            .await
    }

    /// Sends a `PATCH` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch(&self, path: &str, body: impl Into<Value>) -> Result<HttpResponse, ApiError> {
        self.request(HttpRequest::builder(HttpMethod::Patch, path).body(body).build()?)
            .await
    }

    /// Sends a `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.request(HttpRequest::builder(HttpMethod::Delete, path).build()?)
            .await
    }

    /// Parks `attempt` until the refresh settles, starting it if idle.
    async fn await_refresh(&self, attempt: RetryableRequest) -> Result<HttpResponse, ApiError> {
        let parked = self.inner.coordinator.park(attempt);

        if parked.starts_refresh {
            // Spawned so the queue is drained even if this caller is dropped.
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run_refresh().await });
        }

        parked
            .receiver
            .await
            .unwrap_or_else(|_| {
                Err(ApiError::ReauthenticationRequired {
                    reason: "refresh ended without settling the request".to_string(),
                })
            })
    }
}

impl ClientInner {
    /// Sends one attempt of `request`, with the current credential attached.
    async fn send_once(&self, request: &HttpRequest) -> Result<Exchange, ApiError> {
        let url = self.config.base_url().join(&request.path);

        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        let sent_token = self.authenticator.authenticate(&mut headers);
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
            HttpMethod::Put => self.http.put(&url),
            HttpMethod::Patch => self.http.patch(&url),
            HttpMethod::Delete => self.http.delete(&url),
        };

        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(query) = &request.query {
            req_builder = req_builder.query(query);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = parse_response_headers(res.headers());
        let body_text = res.text().await.unwrap_or_default();

        let body = if body_text.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&body_text)
                .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
        };

        tracing::debug!("{} {} -> {}", request.http_method, request.path, code);

        Ok(Exchange {
            response: HttpResponse::new(code, res_headers, body),
            sent_token,
        })
    }

    /// Decides what happens to `attempt` given its response.
    fn dispose(&self, attempt: RetryableRequest, exchange: Exchange) -> Disposition {
        let Exchange {
            response,
            sent_token,
        } = exchange;

        if response.is_ok() {
            return Disposition::Settled(Ok(response));
        }

        if !response.is_unauthorized() {
            return Disposition::Settled(Err(response.to_error().into()));
        }

        if self.config.is_auth_path(attempt.path()) {
            return Disposition::Settled(Err(ApiError::AuthEndpointRejected {
                path: attempt.request.path,
                code: response.code,
                message: response
                    .error_message()
                    .unwrap_or_else(|| "Unauthorized".to_string()),
            }));
        }

        if attempt.already_retried {
            tracing::warn!(
                "Request to {} was rejected after refreshing credentials",
                attempt.path()
            );
            self.expire_session("request rejected after credential refresh".to_string());
            return Disposition::Settled(Err(ApiError::RetryExhausted {
                path: attempt.request.path,
            }));
        }

        let current = self.store.get();
        if current
            .access_token()
            .is_some_and(|token| sent_token.as_deref() != Some(token))
        {
            tracing::debug!(
                "Request to {} carried a replaced access token, replaying",
                attempt.path()
            );
            return Disposition::Stale(attempt);
        }

        Disposition::Unauthorized(attempt)
    }

    /// Performs the refresh and settles every request parked behind it.
    async fn run_refresh(&self) {
        tracing::debug!("Access token rejected, refreshing credentials");

        match self.refresh_credential().await {
            RefreshOutcome::Refreshed => {
                let queue = self.coordinator.finish();
                tracing::debug!(
                    "Credentials refreshed, replaying {} request(s)",
                    queue.len()
                );
                for pending in queue {
                    let outcome = self.replay(pending.request.clone()).await;
                    pending.settle(outcome);
                }
            }
            RefreshOutcome::Failed(reason) => {
                tracing::warn!("Credential refresh failed: {reason}");
                self.reject_queue(&reason);
                self.publish_expired(reason);
            }
            RefreshOutcome::Superseded => {
                tracing::info!("Session changed during credential refresh, discarding result");
                self.reject_queue("session changed while refreshing credentials");
            }
        }
    }

    /// Settles every parked request with `ReauthenticationRequired`.
    fn reject_queue(&self, reason: &str) {
        for pending in self.coordinator.finish() {
            pending.settle(Err(ApiError::ReauthenticationRequired {
                reason: reason.to_string(),
            }));
        }
    }

    /// Exchanges the stored refresh token and writes the outcome back, unless
    /// the credential it started from was replaced in the meantime.
    async fn refresh_credential(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.store.get().refresh_token().map(String::from) else {
            self.store.clear();
            return RefreshOutcome::Failed("no refresh token available".to_string());
        };

        let (next, outcome) = match self.exchange_refresh_token(&refresh_token).await {
            Ok(next) => (next, RefreshOutcome::Refreshed),
            Err(reason) => (Credential::default(), RefreshOutcome::Failed(reason)),
        };

        if self.store.replace_if_refresh(&refresh_token, next) {
            outcome
        } else {
            RefreshOutcome::Superseded
        }
    }

    /// Calls the refresh endpoint and builds the next credential pair.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<Credential, String> {
        let path = self.config.auth_path("refresh");
        let url = self.config.base_url().join(&path);
        let tokens =
            refresh::request_refresh(&self.http, &url, &path, &self.default_headers, refresh_token)
                .await
                .map_err(|e| e.to_string())?;

        let next_refresh_token = match (
            tokens.rotated_refresh_token(),
            self.config.refresh_token_policy(),
        ) {
            (Some(rotated), _) => rotated.to_string(),
            (None, RefreshTokenPolicy::KeepExisting) => refresh_token.to_string(),
            (None, RefreshTokenPolicy::RequireRotation) => {
                return Err("refresh response did not include a new refresh token".to_string());
            }
        };

        Ok(Credential::new(tokens.access_token, Some(next_refresh_token)))
    }

    /// Sends a parked request once more with the refreshed credential.
    async fn replay(&self, attempt: RetryableRequest) -> Result<HttpResponse, ApiError> {
        let attempt = attempt.into_retry();
        tracing::debug!("Replaying {} {}", attempt.request.http_method, attempt.path());

        let exchange = self.send_once(&attempt.request).await?;
        match self.dispose(attempt, exchange) {
            Disposition::Settled(outcome) => outcome,
            Disposition::Unauthorized(attempt) | Disposition::Stale(attempt) => {
                Err(ApiError::RetryExhausted {
                    path: attempt.request.path,
                })
            }
        }
    }

    /// Clears the credential and tells subscribers the session ended.
    fn expire_session(&self, reason: String) {
        self.store.clear();
        self.publish_expired(reason);
    }

    fn publish_expired(&self, reason: String) {
        if self.events.send(SessionEvent::Expired { reason }).is_err() {
            tracing::debug!("Session expired with no event subscribers");
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("coordinator", &self.inner.coordinator)
            .finish_non_exhaustive()
    }
}

/// Parses response headers into a `HashMap` keyed by lower-cased name.
fn parse_response_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        let key = name.as_str().to_lowercase();
        let value = value.to_str().unwrap_or_default().to_string();
        result.entry(key).or_default().push(value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use crate::config::BaseUrl;

    fn client(config: ClientConfig) -> ApiClient {
        ApiClient::new(config, Arc::new(MemoryCredentialStore::new())).unwrap()
    }

    #[test]
    fn test_user_agent_header_format() {
        let client = client(ClientConfig::builder().build().unwrap());

        let user_agent = client.user_agent();
        assert!(user_agent.starts_with("dokumen-api-client v"));
        assert!(user_agent.ends_with(SDK_VERSION));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let config = ClientConfig::builder()
            .user_agent_prefix("Dashboard/2.0")
            .build()
            .unwrap();

        assert!(client(config).user_agent().starts_with("Dashboard/2.0 | "));
    }

    #[test]
    fn test_accept_header_is_json() {
        let client = client(ClientConfig::builder().build().unwrap());
        assert_eq!(
            client.inner.default_headers.get("Accept"),
            Some(&"application/json".to_string())
        );
        assert!(!client.inner.default_headers.contains_key("Authorization"));
    }

    #[test]
    fn test_new_client_is_idle() {
        let client = client(ClientConfig::builder().build().unwrap());
        assert!(!client.is_refreshing());
        assert_eq!(client.queued_requests(), 0);
    }

    #[test]
    fn test_clones_share_store_and_state() {
        let config = ClientConfig::builder()
            .base_url(BaseUrl::new("https://api.example.com/api").unwrap())
            .build()
            .unwrap();
        let client = client(config);
        let clone = client.clone();

        clone.store().set(Credential::new("t1", None));
        assert_eq!(client.store().get().access_token(), Some("t1"));
        assert_eq!(clone.config().base_url().host_name(), "api.example.com");
    }

    fn attempt(path: &str) -> RetryableRequest {
        RetryableRequest::new(HttpRequest::builder(HttpMethod::Get, path).build().unwrap())
    }

    fn exchange(code: u16, sent_token: Option<&str>) -> Exchange {
        Exchange {
            response: HttpResponse::new(code, HashMap::new(), serde_json::json!({})),
            sent_token: sent_token.map(String::from),
        }
    }

    #[test]
    fn test_dispose_settles_success_and_errors() {
        let client = client(ClientConfig::builder().build().unwrap());

        assert!(matches!(
            client.inner.dispose(attempt("dokumen"), exchange(200, None)),
            Disposition::Settled(Ok(_))
        ));
        assert!(matches!(
            client.inner.dispose(attempt("dokumen"), exchange(403, None)),
            Disposition::Settled(Err(ApiError::Response(e))) if e.code == 403
        ));
        assert!(matches!(
            client.inner.dispose(attempt("auth/login"), exchange(401, None)),
            Disposition::Settled(Err(ApiError::AuthEndpointRejected { code: 401, .. }))
        ));
        assert!(matches!(
            client.inner.dispose(attempt("auth/me"), exchange(401, None)),
            Disposition::Unauthorized(_)
        ));
        assert!(matches!(
            client.inner.dispose(attempt("dokumen"), exchange(401, None)),
            Disposition::Unauthorized(_)
        ));
    }

    #[test]
    fn test_dispose_replays_401_for_replaced_token() {
        let client = client(ClientConfig::builder().build().unwrap());
        client.store().set(Credential::new("t2", Some("r2".to_string())));

        assert!(matches!(
            client.inner.dispose(attempt("dokumen"), exchange(401, Some("t1"))),
            Disposition::Stale(_)
        ));
        assert!(matches!(
            client.inner.dispose(attempt("dokumen"), exchange(401, None)),
            Disposition::Stale(_)
        ));
        assert!(matches!(
            client.inner.dispose(attempt("dokumen"), exchange(401, Some("t2"))),
            Disposition::Unauthorized(_)
        ));
    }

    #[test]
    fn test_dispose_exhausts_replayed_request_and_clears_store() {
        let client = client(ClientConfig::builder().build().unwrap());
        client.store().set(Credential::new("t2", Some("r2".to_string())));
        let mut events = client.subscribe();

        let replayed = attempt("dokumen").into_retry();

        assert!(matches!(
            client.inner.dispose(replayed, exchange(401, Some("t2"))),
            Disposition::Settled(Err(ApiError::RetryExhausted { .. }))
        ));
        assert!(client.store().get().is_empty());
        assert!(matches!(
            events.try_recv(),
            Ok(SessionEvent::Expired { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_clears_store() {
        let client = client(ClientConfig::builder().build().unwrap());
        client.store().set(Credential::new("t1", None));

        let outcome = client.inner.refresh_credential().await;

        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        assert!(client.store().get().is_empty());
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiClient>();
    }
}
