//! Normalized response envelope returned by the dispatcher.

use bytes::Bytes;
use std::collections::HashMap;

use crate::http::request::Method;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const CONFLICT: StatusCode = StatusCode(409);
    pub const UNPROCESSABLE_ENTITY: StatusCode = StatusCode(422);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Check if the status code indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Check if the status code indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Check if the status code indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// The raw numeric code.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sanitized summary of the request that produced a response.
///
/// Carried on the response envelope for diagnostics. Credential header
/// values never appear here in readable form; the dispatcher masks or
/// removes them before the summary is constructed.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// Normalized response envelope.
///
/// Constructed fresh per call from the transport's response, never mutated
/// after the dispatcher attaches the request summary, and discarded once the
/// caller extracts its data.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Reason phrase reported by the transport.
    pub status_text: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Option<Bytes>,
    /// Sanitized metadata about the originating request.
    pub request: Option<RequestSummary>,
}

impl ApiResponse {
    /// Create a response envelope with the given status and no body.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            status_text: String::new(),
            headers: HashMap::new(),
            body: None,
            request: None,
        }
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn data<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }

    /// Extract the server-supplied error message from a JSON body.
    ///
    /// Reads `message` first, then `error`, as the backend uses both shapes.
    pub fn server_message(&self) -> Option<String> {
        let value: serde_json::Value = self.data()?.ok()?;
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    return Some(text.to_string());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_helpers() {
        assert!(StatusCode::OK.is_success());
        assert!(StatusCode::CREATED.is_success());
        assert!(!StatusCode::NOT_FOUND.is_success());

        assert!(StatusCode::CONFLICT.is_client_error());
        assert!(StatusCode::UNPROCESSABLE_ENTITY.is_client_error());
        assert!(!StatusCode::OK.is_client_error());

        assert!(StatusCode::INTERNAL_SERVER_ERROR.is_server_error());
        assert!(!StatusCode::BAD_REQUEST.is_server_error());
    }

    #[test]
    fn server_message_prefers_message_field() {
        let response = ApiResponse::new(StatusCode::CONFLICT)
            .body(r#"{"message":"already exists","error":"conflict"}"#);
        assert_eq!(response.server_message(), Some("already exists".to_string()));
    }

    #[test]
    fn server_message_falls_back_to_error_field() {
        let response = ApiResponse::new(StatusCode::BAD_REQUEST).body(r#"{"error":"bad input"}"#);
        assert_eq!(response.server_message(), Some("bad input".to_string()));
    }

    #[test]
    fn server_message_ignores_blank_fields() {
        let response =
            ApiResponse::new(StatusCode::BAD_REQUEST).body(r#"{"message":"  ","error":"real"}"#);
        assert_eq!(response.server_message(), Some("real".to_string()));
    }

    #[test]
    fn server_message_is_none_for_non_json_body() {
        let response = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR).body("<html>oops</html>");
        assert_eq!(response.server_message(), None);
    }

    #[test]
    fn data_decodes_typed_payloads() {
        #[derive(serde::Deserialize)]
        struct Payload {
            count: u32,
        }

        let response = ApiResponse::new(StatusCode::OK).body(r#"{"count":42}"#);
        let payload: Payload = response.data().unwrap().unwrap();
        assert_eq!(payload.count, 42);
    }
}
