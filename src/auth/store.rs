//! Durable storage for the credential pair and session context.
//!
//! The [`CredentialStore`] trait is the only place tokens live. Two
//! implementations are provided:
//!
//! - [`MemoryCredentialStore`]: process-local, for tests and short-lived tools
//! - [`FileCredentialStore`]: a JSON file that survives restarts
//!
//! Both keep the credential pair and the context value under a single lock,
//! so [`CredentialStore::clear`] is atomic with respect to readers.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Credential;

/// Errors raised while opening a credential file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file could not be read.
    #[error("Failed to read credential file '{path}': {source}")]
    Io {
        /// Path of the credential file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The file exists but does not contain a valid credential document.
    #[error("Credential file '{path}' is corrupt: {source}")]
    Corrupt {
        /// Path of the credential file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous key-value persistence for the active credential pair.
///
/// Tokens are opaque strings; no validation happens here. Implementations
/// must be safe to share between the client and the session, and `clear`
/// must never let a reader observe one token removed but not the other.
pub trait CredentialStore: Send + Sync {
    /// Returns a copy of the current credential pair.
    fn get(&self) -> Credential;

    /// Replaces the credential pair.
    fn set(&self, credential: Credential);

    /// Removes both tokens in one step.
    fn clear(&self);

    /// Replaces the credential pair only if the stored refresh token is still
    /// `expected_refresh`.
    ///
    /// The check and the write happen atomically. Returns `false`, leaving the
    /// store untouched, if the pair was replaced or cleared in the meantime.
    fn replace_if_refresh(&self, expected_refresh: &str, next: Credential) -> bool;

    /// Returns the session context value (the active fiscal year).
    fn context(&self) -> Option<String>;

    /// Sets the session context value.
    fn set_context(&self, context: &str);

    /// Removes the session context value.
    fn clear_context(&self);
}

/// Everything a store persists. Field names double as the storage keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredState {
    #[serde(flatten)]
    credential: Credential,
    #[serde(
        rename = "selected_year",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    context: Option<String>,
}

/// In-memory credential store.
///
/// # Example
///
/// ```rust
/// use dokumen_api::{Credential, CredentialStore, MemoryCredentialStore};
///
/// let store = MemoryCredentialStore::new();
/// store.set(Credential::new("access", Some("refresh".to_string())));
/// store.set_context("2025");
///
/// store.clear();
/// assert!(store.get().is_empty());
/// assert_eq!(store.context().as_deref(), Some("2025"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    state: RwLock<StoredState>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a credential.
    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            state: RwLock::new(StoredState {
                credential,
                context: None,
            }),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Credential {
        self.state.read().credential.clone()
    }

    fn set(&self, credential: Credential) {
        self.state.write().credential = credential;
    }

    fn clear(&self) {
        self.state.write().credential = Credential::default();
    }

    fn replace_if_refresh(&self, expected_refresh: &str, next: Credential) -> bool {
        let mut state = self.state.write();
        if state.credential.refresh_token() != Some(expected_refresh) {
            return false;
        }
        state.credential = next;
        true
    }

    fn context(&self) -> Option<String> {
        self.state.read().context.clone()
    }

    fn set_context(&self, context: &str) {
        self.state.write().context = Some(context.to_string());
    }

    fn clear_context(&self) {
        self.state.write().context = None;
    }
}

/// Credential store backed by a JSON file.
///
/// The file is read once on [`open`](Self::open). Every mutation updates the
/// in-memory mirror and rewrites the file through a temporary sibling that is
/// renamed into place, so a crash never leaves a half-written document.
///
/// A failed write is logged and does not fail the operation: the mirror stays
/// authoritative for the running process.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    state: RwLock<StoredState>,
}

impl FileCredentialStore {
    /// Opens (or lazily creates) the credential file at `path`.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be read, or
    /// [`StorageError::Corrupt`] if it does not parse.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => StoredState::default(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoredState::default(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, mutate: impl FnOnce(&mut StoredState)) {
        self.update_if(|state| {
            mutate(state);
            true
        });
    }

    /// Applies `mutate` and persists the result if it reports a change.
    fn update_if(&self, mutate: impl FnOnce(&mut StoredState) -> bool) -> bool {
        let mut state = self.state.write();
        if !mutate(&mut state) {
            return false;
        }
        // Written under the lock so concurrent updates hit the disk in order.
        if let Err(e) = Self::persist(&self.path, &state) {
            tracing::warn!(
                "Failed to persist credentials to {}: {}",
                self.path.display(),
                e
            );
        }
        true
    }

    fn persist(path: &Path, state: &StoredState) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Credential {
        self.state.read().credential.clone()
    }

    fn set(&self, credential: Credential) {
        self.update(|state| state.credential = credential);
    }

    fn clear(&self) {
        self.update(|state| state.credential = Credential::default());
    }

    fn replace_if_refresh(&self, expected_refresh: &str, next: Credential) -> bool {
        self.update_if(|state| {
            if state.credential.refresh_token() != Some(expected_refresh) {
                return false;
            }
            state.credential = next;
            true
        })
    }

    fn context(&self) -> Option<String> {
        self.state.read().context.clone()
    }

    fn set_context(&self, context: &str) {
        self.update(|state| state.context = Some(context.to_string()));
    }

    fn clear_context(&self) {
        self.update(|state| state.context = None);
    }
}

// Verify stores are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemoryCredentialStore>();
    assert_send_sync::<FileCredentialStore>();
};
