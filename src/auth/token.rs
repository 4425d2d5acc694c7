//! Token payloads returned by the login and refresh endpoints.
//!
//! The backend wraps tokens as `{"data": {"token": {...}, "user": {...}}}`,
//! while older deployments answer with the token fields at the body root.
//! [`TokenResponse::from_body`] accepts both.

use serde::Deserialize;
use serde_json::Value;

/// Tokens issued by `auth/login` or `auth/refresh`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    /// The new access token.
    #[serde(alias = "token")]
    pub access_token: String,

    /// A rotated refresh token, if the backend issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Extracts the token payload from a response body.
    ///
    /// Looks at `data.token`, then `data`, then the body root, and returns
    /// the first location holding a non-empty access token.
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        let data = body.get("data");
        [data.and_then(|d| d.get("token")), data, Some(body)]
            .into_iter()
            .flatten()
            .filter_map(|candidate| Self::deserialize(candidate).ok())
            .find(|tokens| !tokens.access_token.is_empty())
    }

    /// Returns the rotated refresh token, ignoring empty strings.
    #[must_use]
    pub fn rotated_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_body_reads_wrapped_payload() {
        let body = json!({
            "message": "Login successful",
            "data": {
                "user": {"id": "1"},
                "token": {
                    "access_token": "a1",
                    "refresh_token": "r1",
                    "expires_in": 900,
                    "token_type": "Bearer"
                }
            }
        });

        let tokens = TokenResponse::from_body(&body).unwrap();
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.rotated_refresh_token(), Some("r1"));
        assert_eq!(tokens.expires_in, Some(900));
    }

    #[test]
    fn test_from_body_reads_root_payload() {
        let body = json!({"access_token": "a2"});
        let tokens = TokenResponse::from_body(&body).unwrap();
        assert_eq!(tokens.access_token, "a2");
        assert!(tokens.rotated_refresh_token().is_none());
    }

    #[test]
    fn test_from_body_accepts_token_alias() {
        let body = json!({"token": "a3", "refresh_token": ""});
        let tokens = TokenResponse::from_body(&body).unwrap();
        assert_eq!(tokens.access_token, "a3");
        assert!(tokens.rotated_refresh_token().is_none());
    }

    #[test]
    fn test_from_body_rejects_missing_or_empty_token() {
        assert!(TokenResponse::from_body(&json!({})).is_none());
        assert!(TokenResponse::from_body(&json!({"access_token": ""})).is_none());
        assert!(TokenResponse::from_body(&json!({"data": {"user": {}}})).is_none());
    }
}
