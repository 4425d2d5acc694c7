//! # Dokumen API Client
//!
//! An async client for the document management backend, with transparent
//! credential refresh.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Pluggable credential storage through [`CredentialStore`], with
//!   in-memory and file-backed implementations
//! - An async HTTP client that attaches the bearer token and session context
//!   to every request
//! - Single-flight refresh: however many requests fail with `401` at once,
//!   the credential is refreshed by one call and the failed requests are
//!   replayed in the order they arrived
//! - Login, logout and profile state via [`AuthSession`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dokumen_api::{ApiClient, BaseUrl, ClientConfig, MemoryCredentialStore};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://dokumen.example.go.id/api").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let client = ApiClient::new(config, Arc::new(MemoryCredentialStore::new())).unwrap();
//! assert!(!client.is_refreshing());
//! ```
//!
//! ## Signing In
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dokumen_api::{ApiClient, AuthSession, ClientConfig, FileCredentialStore};
//!
//! let store = Arc::new(FileCredentialStore::open("session.json")?);
//! let client = ApiClient::new(ClientConfig::builder().build()?, store)?;
//! let session = AuthSession::new(client.clone());
//!
//! // Rehydrate a persisted session, or sign in.
//! session.initialize().await;
//! if !session.is_authenticated() {
//!     session.login("alice", "secret", "2025").await?;
//! }
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use dokumen_api::clients::{HttpMethod, HttpRequest};
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "dokumen")
//!     .query_param("page", "1")
//!     .build()?;
//!
//! // An expired access token is refreshed and the request replayed
//! // without the caller noticing.
//! let response = client.request(request).await?;
//! ```
//!
//! ## Session Expiry
//!
//! When the credential cannot be refreshed, the store is cleared, pending
//! requests fail with a terminal [`ApiError`] and a [`SessionEvent::Expired`]
//! is published:
//!
//! ```rust,ignore
//! let mut events = client.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(SessionEvent::Expired { reason }) = events.recv().await {
//!         tracing::info!("Session ended: {reason}");
//!         // Route the user back to the login screen.
//!     }
//! });
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Each client owns its refresh state
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **No hidden retries**: Only an expired credential causes a replay, and
//!   only once

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use auth::{
    AuthSession, Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    Officer, Profile, Role, ScopeAssignment, SessionError, StorageError, TokenResponse,
};
pub use config::{BaseUrl, ClientConfig, ClientConfigBuilder, ContextHeader, RefreshTokenPolicy};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiClient, ApiError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, SessionEvent,
};
