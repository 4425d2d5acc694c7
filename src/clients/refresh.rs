//! Single-flight credential refresh.
//!
//! When a request is rejected with `401 Unauthorized`, the client parks it in
//! the [`RefreshCoordinator`] instead of failing it. The first parked request
//! moves the coordinator from idle to refreshing and starts the one refresh
//! call; every later 401 joins the queue behind it. When the refresh settles,
//! the queue is drained and the coordinator returns to idle in the same
//! critical section, then each drained request is settled in arrival order.
//!
//! # State
//!
//! ```text
//!            first 401                  refresh settles
//!   Idle ─────────────────▶ Refreshing ─────────────────▶ Idle
//!                            │    ▲     (drain + reset)
//!                            └────┘
//!                          later 401s queue
//! ```
//!
//! The lock guarding the state is only taken in short synchronous sections
//! and is never held across an `.await`.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::auth::TokenResponse;
use crate::clients::errors::ApiError;
use crate::clients::http_request::RetryableRequest;
use crate::clients::http_response::HttpResponse;

/// Outcome delivered to a parked caller.
pub(crate) type Settlement = Result<HttpResponse, ApiError>;

/// A request suspended until the in-flight refresh settles.
///
/// Dropping a `PendingRequest` without settling it closes the caller's
/// channel, which the caller reports as a terminal failure.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub(crate) request: RetryableRequest,
    settle: oneshot::Sender<Settlement>,
}

impl PendingRequest {
    /// Delivers the outcome to the waiting caller. Consumes the entry, so a
    /// request is settled exactly once.
    pub(crate) fn settle(self, outcome: Settlement) {
        if self.settle.send(outcome).is_err() {
            tracing::debug!(
                "Caller for {} stopped waiting before its request settled",
                self.request.path()
            );
        }
    }
}

/// Result of parking a request.
#[derive(Debug)]
pub(crate) struct Parked {
    /// Resolves once the request is settled.
    pub(crate) receiver: oneshot::Receiver<Settlement>,
    /// `true` if this request moved the coordinator to refreshing; the caller
    /// must start the refresh.
    pub(crate) starts_refresh: bool,
}

#[derive(Debug, Default)]
struct RefreshState {
    in_flight: bool,
    queue: VecDeque<PendingRequest>,
}

/// Owns the refresh state of one client.
///
/// Each [`ApiClient`](crate::ApiClient) holds its own coordinator, so
/// independent clients never share refresh state.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a refresh call is outstanding.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Returns how many requests are waiting for the current refresh.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Queues `request` behind the current refresh, starting one if idle.
    pub(crate) fn park(&self, request: RetryableRequest) -> Parked {
        let (settle, receiver) = oneshot::channel();
        let mut state = self.state.lock();

        let starts_refresh = !state.in_flight;
        state.in_flight = true;
        state.queue.push_back(PendingRequest { request, settle });

        if !starts_refresh {
            tracing::debug!(
                "Refresh in flight, queued request ({} waiting)",
                state.queue.len()
            );
        }

        Parked {
            receiver,
            starts_refresh,
        }
    }

    /// Takes every parked request in arrival order and returns to idle.
    ///
    /// Both happen under one lock acquisition: a 401 arriving afterwards
    /// starts a fresh refresh instead of joining a queue nobody will drain.
    pub(crate) fn finish(&self) -> VecDeque<PendingRequest> {
        let mut state = self.state.lock();
        state.in_flight = false;
        std::mem::take(&mut state.queue)
    }
}

/// Request body for `auth/refresh`.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenRequest<'a> {
    pub(crate) refresh_token: &'a str,
}

/// Sends the refresh call.
///
/// `headers` must not contain an `Authorization` header: the refresh token
/// in the body is the only credential.
pub(crate) async fn request_refresh(
    http: &reqwest::Client,
    url: &str,
    path: &str,
    headers: &std::collections::HashMap<String, String>,
    refresh_token: &str,
) -> Result<TokenResponse, ApiError> {
    let mut builder = http.post(url).json(&RefreshTokenRequest { refresh_token });
    for (key, value) in headers {
        builder = builder.header(key, value);
    }

    let response = builder.send().await?;
    let code = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let body: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();

    if !(200..=299).contains(&code) {
        let parsed = HttpResponse::new(code, std::collections::HashMap::new(), body);
        return Err(ApiError::AuthEndpointRejected {
            path: path.to_string(),
            code,
            message: parsed
                .error_message()
                .unwrap_or_else(|| format!("Refresh failed with status {code}")),
        });
    }

    TokenResponse::from_body(&body).ok_or_else(|| ApiError::InvalidResponse {
        message: "refresh response did not contain an access token".to_string(),
    })
}

// Verify the coordinator is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RefreshCoordinator>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::http_request::{HttpMethod, HttpRequest};

    fn attempt(path: &str) -> RetryableRequest {
        RetryableRequest::new(HttpRequest::builder(HttpMethod::Get, path).build().unwrap())
    }

    #[test]
    fn test_first_park_starts_refresh() {
        let coordinator = RefreshCoordinator::new();
        assert!(!coordinator.is_refreshing());

        let parked = coordinator.park(attempt("a"));
        assert!(parked.starts_refresh);
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.queued(), 1);
    }

    #[test]
    fn test_later_parks_only_queue() {
        let coordinator = RefreshCoordinator::new();
        let first = coordinator.park(attempt("a"));
        let second = coordinator.park(attempt("b"));
        let third = coordinator.park(attempt("c"));

        assert!(first.starts_refresh);
        assert!(!second.starts_refresh);
        assert!(!third.starts_refresh);
        assert_eq!(coordinator.queued(), 3);
    }

    #[test]
    fn test_finish_drains_in_arrival_order_and_resets() {
        let coordinator = RefreshCoordinator::new();
        let _a = coordinator.park(attempt("a"));
        let _b = coordinator.park(attempt("b"));
        let _c = coordinator.park(attempt("c"));

        let drained: Vec<_> = coordinator
            .finish()
            .into_iter()
            .map(|p| p.request.path().to_string())
            .collect();

        assert_eq!(drained, ["a", "b", "c"]);
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.queued(), 0);

        // The next 401 starts a new refresh.
        assert!(coordinator.park(attempt("d")).starts_refresh);
    }

    #[tokio::test]
    async fn test_settle_delivers_to_caller_once() {
        let coordinator = RefreshCoordinator::new();
        let parked = coordinator.park(attempt("a"));

        for pending in coordinator.finish() {
            pending.settle(Err(ApiError::ReauthenticationRequired {
                reason: "refresh rejected".to_string(),
            }));
        }

        let outcome = parked.receiver.await.unwrap();
        assert!(matches!(
            outcome,
            Err(ApiError::ReauthenticationRequired { .. })
        ));
    }

    #[test]
    fn test_settle_tolerates_dropped_caller() {
        let coordinator = RefreshCoordinator::new();
        drop(coordinator.park(attempt("a")));

        for pending in coordinator.finish() {
            pending.settle(Err(ApiError::RetryExhausted {
                path: "a".to_string(),
            }));
        }
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn test_refresh_request_body_shape() {
        let json = serde_json::to_string(&RefreshTokenRequest {
            refresh_token: "r1",
        })
        .unwrap();
        assert_eq!(json, r#"{"refresh_token":"r1"}"#);
    }
}
