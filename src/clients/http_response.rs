//! HTTP response type for the API client.

use std::collections::HashMap;

use serde_json::Value;

use crate::clients::errors::HttpResponseError;

/// An HTTP response from the backend.
///
/// Header names are lower-cased; a header may carry several values.
///
/// # Example
///
/// ```rust
/// use dokumen_api::clients::HttpResponse;
/// use std::collections::HashMap;
/// use serde_json::json;
///
/// let response = HttpResponse::new(200, HashMap::new(), json!({"data": [1, 2]}));
/// assert!(response.is_ok());
/// assert_eq!(response.data(), &json!([1, 2]));
/// ```
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers.
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body (`{}` when empty).
    pub body: Value,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(code: u16, headers: HashMap<String, Vec<String>>, body: Value) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns `true` if the backend rejected the credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.code == 401
    }

    /// Returns the first value of a header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `data` envelope of the body, or the whole body when the
    /// backend did not wrap it.
    #[must_use]
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&self.body)
    }

    /// Extracts a human-readable error message from the body.
    ///
    /// Reads `error`, then `message`, then joins the values of an `errors`
    /// object (field validation errors), skipping blanks.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let text = |key: &str| {
            self.body
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        text("error").or_else(|| text("message")).or_else(|| {
            let joined = match self.body.get("errors")? {
                Value::Object(fields) => fields
                    .values()
                    .filter_map(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::String(s) => s.clone(),
                _ => String::new(),
            };
            (!joined.is_empty()).then_some(joined)
        })
    }

    /// Converts a failed response into an [`HttpResponseError`].
    #[must_use]
    pub fn to_error(&self) -> HttpResponseError {
        HttpResponseError {
            code: self.code,
            message: self
                .error_message()
                .unwrap_or_else(|| format!("Request failed with status {}", self.code)),
            error_reference: self.request_id().map(String::from),
        }
    }
}
