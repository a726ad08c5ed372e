//! Dispatch failure taxonomy.

use thiserror::Error;

use crate::http::{ApiResponse, StatusCode};

/// Phrases that identify a transport failure as a certificate problem.
const CERTIFICATE_PHRASES: [&str; 3] = ["certificate", "ssl", "tls"];

/// Failure propagated by the dispatcher.
///
/// The dispatcher never maps these to user-facing messages; that is the
/// calling service's job. The three variants mirror the three classification
/// buckets: the server answered with an error status, the request was sent
/// but nothing came back, or the call failed before leaving the client.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The server answered with a non-2xx status.
    #[error("server responded with status {}", .response.status)]
    Status {
        /// The full response envelope, untransformed.
        response: ApiResponse,
    },

    /// The request was sent but no response arrived (network or timeout).
    #[error("no response received: {message}")]
    NoResponse { message: String },

    /// The call failed locally before or after the wire (request build,
    /// body read, serialization).
    #[error("{message}")]
    Local { message: String },
}

impl DispatchError {
    /// The response envelope, when the server answered.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            DispatchError::Status { response } => Some(response),
            _ => None,
        }
    }

    /// The response status, when the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(|r| r.status)
    }

    /// The server-supplied error message, when one is present.
    pub fn server_message(&self) -> Option<String> {
        self.response().and_then(|r| r.server_message())
    }

    /// Whether this is a transport failure caused by certificate validation.
    ///
    /// Used by the upload path to decide between surfacing the failure and
    /// retrying through the same-origin proxy.
    pub fn is_certificate_error(&self) -> bool {
        match self {
            DispatchError::NoResponse { message } => {
                let lowered = message.to_lowercase();
                CERTIFICATE_PHRASES.iter().any(|p| lowered.contains(p))
            }
            _ => false,
        }
    }
}
