//! Authentication types for the API client.
//!
//! This module provides the credential model, where credentials are kept,
//! and the signed-in user's session.
//!
//! # Overview
//!
//! - [`Credential`]: The access/refresh token pair
//! - [`CredentialStore`]: Where the credential and session context live
//! - [`MemoryCredentialStore`]: Process-local store
//! - [`FileCredentialStore`]: Store persisted to a JSON file
//! - [`TokenResponse`]: Tokens issued by the login and refresh endpoints
//! - [`Profile`]: The authenticated user, with its [`Role`]
//! - [`AuthSession`]: Login, logout and profile state
//!
//! # Session Lifecycle
//!
//! 1. [`AuthSession::login`] stores the issued credential and the session
//!    context (for example, the selected budget year).
//! 2. Every request carries the access token; when it expires the client
//!    refreshes it transparently.
//! 3. If the refresh fails, the store is cleared and the session becomes
//!    unauthenticated. [`AuthSession::logout`] clears it explicitly.
//!
//! # Example
//!
//! ```rust
//! use dokumen_api::{Credential, CredentialStore, MemoryCredentialStore};
//!
//! let store = MemoryCredentialStore::new();
//! store.set(Credential::new("access", Some("refresh".to_string())));
//! store.set_context("2025");
//!
//! assert_eq!(store.get().access_token(), Some("access"));
//!
//! store.clear();
//! assert!(store.get().is_empty());
//! // The context survives clearing the credential.
//! assert_eq!(store.context().as_deref(), Some("2025"));
//! ```

mod credential;
mod error;
mod profile;
pub mod session;
mod store;
mod token;

pub use credential::Credential;
pub use error::SessionError;
pub use profile::{Officer, Profile, Role, ScopeAssignment};
pub use session::AuthSession;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StorageError};
pub use token::TokenResponse;
