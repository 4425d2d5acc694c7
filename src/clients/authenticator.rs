//! Attaches credentials and the session context to outgoing requests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::ContextHeader;

/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Pre-flight step run on every request the client sends.
///
/// Reads the [`CredentialStore`] and adds `Authorization: Bearer <token>`
/// when an access token is present, and the context header when a context
/// value is set. Absent values leave the headers untouched. This never blocks
/// and never fails.
///
/// The attached access token is returned so a 401 can later be matched
/// against the credential that was actually sent.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use dokumen_api::{ContextHeader, Credential, CredentialStore, MemoryCredentialStore};
/// use dokumen_api::clients::RequestAuthenticator;
///
/// let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("t1", None)));
/// store.set_context("2025");
///
/// let authenticator = RequestAuthenticator::new(store, ContextHeader::default());
/// let mut headers = HashMap::new();
/// let sent = authenticator.authenticate(&mut headers);
///
/// assert_eq!(sent.as_deref(), Some("t1"));
/// assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer t1"));
/// assert_eq!(headers.get("X-Tahun-Anggaran").map(String::as_str), Some("2025"));
/// ```
#[derive(Clone)]
pub struct RequestAuthenticator {
    store: Arc<dyn CredentialStore>,
    context_header: ContextHeader,
}

impl RequestAuthenticator {
    /// Creates an authenticator reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, context_header: ContextHeader) -> Self {
        Self {
            store,
            context_header,
        }
    }

    /// Adds the authorization and context headers to `headers` and returns
    /// the access token that was attached, if any.
    pub fn authenticate(&self, headers: &mut HashMap<String, String>) -> Option<String> {
        let token = self.store.get().access_token().map(String::from);
        if let Some(token) = &token {
            headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"));
        }

        if let Some(context) = self.store.context().filter(|c| !c.is_empty()) {
            headers.insert(self.context_header.as_ref().to_string(), context);
        }

        token
    }
}

impl std::fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("context_header", &self.context_header)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, MemoryCredentialStore};

    fn authenticator(store: Arc<MemoryCredentialStore>) -> RequestAuthenticator {
        RequestAuthenticator::new(store, ContextHeader::default())
    }

    #[test]
    fn test_no_headers_without_token_or_context() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut headers = HashMap::new();
        assert!(authenticator(store).authenticate(&mut headers).is_none());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_empty_token_is_not_attached() {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential {
            access_token: Some(String::new()),
            refresh_token: None,
        }));
        store.set_context("");

        let mut headers = HashMap::new();
        authenticator(store).authenticate(&mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_reads_latest_store_value() {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "old", None,
        )));
        let auth = authenticator(Arc::clone(&store));

        store.set(Credential::new("new", None));
        let mut headers = HashMap::new();
        let sent = auth.authenticate(&mut headers);
        assert_eq!(sent.as_deref(), Some("new"));
        assert_eq!(
            headers.get(AUTHORIZATION_HEADER).map(String::as_str),
            Some("Bearer new")
        );
    }

    #[test]
    fn test_custom_context_header() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.set_context("2026");
        let auth = RequestAuthenticator::new(store, ContextHeader::new("X-Fiscal-Year").unwrap());

        let mut headers = HashMap::new();
        auth.authenticate(&mut headers);
        assert_eq!(headers.get("X-Fiscal-Year").map(String::as_str), Some("2026"));
        assert!(!headers.contains_key(AUTHORIZATION_HEADER));
    }
}
