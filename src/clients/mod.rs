//! HTTP client types for the document management backend.
//!
//! This module provides the HTTP client layer: request and response types,
//! the pre-flight [`RequestAuthenticator`], and the [`ApiClient`] that
//! refreshes expired credentials without failing the requests caught by
//! the expiry.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ApiClient`]: The async HTTP client for API communication
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, PATCH, DELETE)
//! - [`RetryableRequest`]: A request paired with its one-replay guard
//! - [`RefreshCoordinator`]: The single-flight refresh state of a client
//! - [`SessionEvent`]: Notifications published when the session is cleared
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dokumen_api::{ApiClient, ClientConfig, FileCredentialStore};
//! use dokumen_api::clients::{HttpMethod, HttpRequest};
//!
//! let store = Arc::new(FileCredentialStore::open("session.json")?);
//! let client = ApiClient::new(ClientConfig::builder().build()?, store)?;
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "dokumen")
//!     .query_param("page", "1")
//!     .build()?;
//!
//! let response = client.request(request).await?;
//! ```
//!
//! # Refresh Behavior
//!
//! - **401 on a regular endpoint**: the request waits while the credential is
//!   refreshed, then is replayed once with the new access token
//! - **401 during a refresh**: the request joins the queue; no second refresh
//!   call is made
//! - **401 for a token already replaced by a refresh**: replayed at once
//!   with the current token; no second refresh call is made
//! - **401 on `login`, `refresh` or `logout`**: returned immediately as
//!   [`ApiError::AuthEndpointRejected`]
//! - **Refresh failure or 401 on the replay**: the credential store is cleared,
//!   [`SessionEvent::Expired`] is published and the caller gets a terminal error
//! - **Login or logout while a refresh is in flight**: the refresh result is
//!   discarded, the store keeps what the login or logout wrote and queued
//!   requests fail with [`ApiError::ReauthenticationRequired`]
//!
//! Nothing else is retried.

mod authenticator;
mod errors;
mod events;
mod http_client;
mod http_request;
mod http_response;
mod refresh;

pub use authenticator::{RequestAuthenticator, AUTHORIZATION_HEADER};
pub use errors::{ApiError, HttpResponseError, InvalidHttpRequestError};
pub use events::SessionEvent;
pub use http_client::{ApiClient, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder, RetryableRequest};
pub use http_response::HttpResponse;
pub use refresh::RefreshCoordinator;
