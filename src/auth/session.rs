//! Login, logout and profile state for the signed-in user.
//!
//! [`AuthSession`] drives the authentication endpoints through an
//! [`ApiClient`] and keeps the user's [`Profile`]. The credential itself lives
//! in the client's [`CredentialStore`](crate::CredentialStore), so a session
//! rehydrated from a persisted store only needs [`AuthSession::initialize`].

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::auth::error::SessionError;
use crate::auth::{Credential, Profile, Role, TokenResponse};
use crate::clients::{ApiClient, ApiError, SessionEvent};

/// The signed-in user's session.
///
/// A session follows the client's [`SessionEvent`]s: when the client clears
/// the credential after a failed refresh, the profile is dropped before the
/// next query, so [`is_authenticated`](Self::is_authenticated) turns `false`.
///
/// # Thread Safety
///
/// `AuthSession` is `Send + Sync`. Share it behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use dokumen_api::{ApiClient, AuthSession, ClientConfig, FileCredentialStore, Role};
///
/// let store = Arc::new(FileCredentialStore::open("session.json")?);
/// let client = ApiClient::new(ClientConfig::builder().build()?, store)?;
/// let session = AuthSession::new(client);
///
/// session.initialize().await;
/// if !session.is_authenticated() {
///     session.login("alice", "secret", "2025").await?;
/// }
/// assert!(session.has_role(&[Role::Admin, Role::SuperAdmin]));
/// ```
pub struct AuthSession {
    client: ApiClient,
    state: Mutex<SessionState>,
}

struct SessionState {
    profile: Option<Profile>,
    events: broadcast::Receiver<SessionEvent>,
}

impl SessionState {
    /// Applies session events published since the last call.
    fn sync(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Expired { .. }) | Err(TryRecvError::Lagged(_)) => {
                    self.profile = None;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

impl AuthSession {
    /// Creates a session on top of `client`.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let events = client.subscribe();
        Self {
            client,
            state: Mutex::new(SessionState {
                profile: None,
                events,
            }),
        }
    }

    /// Returns the client this session authenticates.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Signs in and stores the issued credential.
    ///
    /// On success the credential is written to the store, `context` becomes
    /// the session context (unless empty) and the profile is taken from the
    /// login response or fetched from `auth/me`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoginRejected`] with the backend's message if
    /// the credentials are refused, or [`SessionError::Api`] if the request
    /// fails or the response carries no access token. On error the stored
    /// credential and profile are left as they were.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        context: &str,
    ) -> Result<(), SessionError> {
        let path = self.client.config().auth_path("login");
        let body = json!({
            "username": username,
            "password": password,
            "context": context,
        });

        let response = match self.client.post(&path, body).await {
            Ok(response) => response,
            Err(ApiError::AuthEndpointRejected { message, .. }) => {
                return Err(SessionError::LoginRejected { message });
            }
            Err(ApiError::Response(e)) => {
                return Err(SessionError::LoginRejected { message: e.message });
            }
            Err(e) => return Err(e.into()),
        };

        let tokens =
            TokenResponse::from_body(&response.body).ok_or_else(|| ApiError::InvalidResponse {
                message: "login response did not contain an access token".to_string(),
            })?;

        let refresh_token = tokens.rotated_refresh_token().map(String::from);
        let store = self.client.store();
        store.set(Credential::new(tokens.access_token, refresh_token));
        if !context.is_empty() {
            store.set_context(context);
        }

        let inline_profile = response
            .data()
            .get("user")
            .or_else(|| response.body.get("user"))
            .and_then(|user| Profile::deserialize(user).ok());

        match inline_profile {
            Some(profile) => self.adopt(profile),
            None => self.fetch_profile().await,
        }

        tracing::info!("Signed in as {username}");
        Ok(())
    }

    /// Signs out.
    ///
    /// The backend is notified on a best-effort basis; the credential and
    /// profile are cleared whatever it answers. The session context is kept.
    pub async fn logout(&self) {
        let path = self.client.config().auth_path("logout");
        if let Err(e) = self.client.post(&path, json!({})).await {
            tracing::debug!("Logout request failed: {e}");
        }

        self.client.store().clear();
        let mut state = self.state.lock();
        state.sync();
        state.profile = None;

        tracing::info!("Signed out");
    }

    /// Loads the profile from `auth/me`.
    ///
    /// Does nothing without an access token. Any failure clears the stored
    /// credential and the profile.
    pub async fn fetch_profile(&self) {
        if self.client.store().get().access_token().is_none() {
            return;
        }

        let path = self.client.config().auth_path("me");
        let result = self.client.get(&path).await.and_then(|response| {
            Profile::deserialize(response.data()).map_err(|e| ApiError::InvalidResponse {
                message: format!("unexpected profile payload: {e}"),
            })
        });

        match result {
            Ok(profile) => self.adopt(profile),
            Err(e) => {
                tracing::warn!("Failed to fetch profile: {e}");
                self.client.store().clear();
                self.state.lock().profile = None;
            }
        }
    }

    /// Restores the profile for a credential loaded from a persisted store.
    pub async fn initialize(&self) {
        let has_token = self.client.store().get().access_token().is_some();
        if has_token && self.profile().is_none() {
            self.fetch_profile().await;
        }
    }

    /// Returns the current profile, if known.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        let mut state = self.state.lock();
        state.sync();
        state.profile.clone()
    }

    /// Returns `true` if both an access token and a profile are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.store().get().access_token().is_some() && self.profile().is_some()
    }

    /// Returns `true` if the user's role is one of `roles`.
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.profile().is_some_and(|p| p.has_role(roles))
    }

    /// Returns `true` for administrators, including super administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&[Role::Admin, Role::SuperAdmin])
    }

    /// Returns `true` for super administrators.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.has_role(&[Role::SuperAdmin])
    }

    /// Returns `true` for operators.
    #[must_use]
    pub fn is_operator(&self) -> bool {
        self.has_role(&[Role::Operator])
    }

    /// Returns the session context sent with every request.
    #[must_use]
    pub fn context(&self) -> Option<String> {
        self.client.store().context()
    }

    /// Sets the session context sent with every request.
    pub fn set_context(&self, context: &str) {
        self.client.store().set_context(context);
    }

    fn adopt(&self, profile: Profile) {
        let mut state = self.state.lock();
        state.sync();
        state.profile = Some(profile);
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("client", &self.client)
            .field("profile", &self.state.lock().profile)
            .finish()
    }
}

// Verify AuthSession is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthSession>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, MemoryCredentialStore};
    use crate::config::ClientConfig;
    use std::sync::Arc;

    fn session(store: Arc<MemoryCredentialStore>) -> AuthSession {
        let client = ApiClient::new(ClientConfig::builder().build().unwrap(), store).unwrap();
        AuthSession::new(client)
    }

    fn operator() -> Profile {
        serde_json::from_value(json!({
            "id": "u1",
            "username": "bob",
            "name": "Bob",
            "role": "operator",
        }))
        .unwrap()
    }

    #[test]
    fn test_new_session_is_anonymous() {
        let session = session(Arc::new(MemoryCredentialStore::new()));
        assert!(!session.is_authenticated());
        assert!(session.profile().is_none());
        assert!(!session.has_role(&[Role::Operator]));
    }

    #[test]
    fn test_role_queries() {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "t1", None,
        )));
        let session = session(store);
        session.adopt(operator());

        assert!(session.is_authenticated());
        assert!(session.is_operator());
        assert!(!session.is_admin());
        assert!(!session.is_super_admin());
        assert!(session.has_role(&[Role::Admin, Role::Operator]));
    }

    #[test]
    fn test_profile_alone_is_not_authenticated() {
        let session = session(Arc::new(MemoryCredentialStore::new()));
        session.adopt(operator());
        assert!(!session.is_authenticated());
        assert!(session.profile().is_some());
    }

    #[test]
    fn test_context_roundtrips_through_store() {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = session(Arc::clone(&store));

        session.set_context("2025");
        assert_eq!(session.context().as_deref(), Some("2025"));
        assert_eq!(store.context().as_deref(), Some("2025"));
    }

    #[tokio::test]
    async fn test_fetch_profile_without_token_is_noop() {
        let session = session(Arc::new(MemoryCredentialStore::new()));
        session.fetch_profile().await;
        session.initialize().await;
        assert!(session.profile().is_none());
    }
}
