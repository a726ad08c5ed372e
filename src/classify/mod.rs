//! Failure classification shared by every service call site.
//!
//! Each operation supplies a [`MessageTable`]; one parametrized classifier
//! turns a dispatch failure into the user-facing error for that operation.
//! This collapses what would otherwise be a near-identical status switch
//! duplicated across the service layer into data.

use thiserror::Error;
use tracing::{debug, error};

use crate::client::DispatchError;
use crate::service::auth::LoginCredentials;

/// Fixed message for requests that were sent but never answered.
pub const NO_RESPONSE_MESSAGE: &str = "No server response. Please check your internet connection.";

/// Phrases the backend uses when a session token has expired.
const EXPIRED_TOKEN_PHRASES: [&str; 3] =
    ["token has expired", "token expired", "please generate a new one"];

/// Phrases the backend uses when an account still needs OTP verification.
const VERIFICATION_PHRASES: [&str; 6] = [
    "account is not verified",
    "not verified",
    "verify your account",
    "please verify",
    "otp code sent",
    "resend otp",
];

fn contains_any(message: &str, phrases: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    phrases.iter().any(|phrase| lowered.contains(phrase))
}

/// Whether a server message indicates an expired session token.
pub fn session_expired(message: &str) -> bool {
    contains_any(message, &EXPIRED_TOKEN_PHRASES)
}

/// Whether a server message indicates the account awaits OTP verification.
pub fn needs_verification(message: &str) -> bool {
    contains_any(message, &VERIFICATION_PHRASES)
}

/// Per-operation classification data.
///
/// `entries` maps status codes to user-facing messages; statuses without an
/// entry fall through to the message extracted from the server response, or
/// to `fallback` when the response carried none.
#[derive(Debug, Clone, Copy)]
pub struct MessageTable {
    /// Operation name, used in log lines.
    pub operation: &'static str,
    /// Status-specific messages.
    pub entries: &'static [(u16, &'static str)],
    /// Message used when nothing better is available.
    pub fallback: &'static str,
    /// Treat a 404 as "feature not available yet" instead of an error.
    pub silent_not_found: bool,
}

impl MessageTable {
    /// Create a table for an operation.
    pub const fn new(
        operation: &'static str,
        entries: &'static [(u16, &'static str)],
        fallback: &'static str,
    ) -> Self {
        Self {
            operation,
            entries,
            fallback,
            silent_not_found: false,
        }
    }

    /// Mark 404 responses as silent for this operation.
    pub const fn silent_not_found(mut self) -> Self {
        self.silent_not_found = true;
        self
    }

    /// Look up the message for a status code.
    pub fn message_for(&self, status: u16) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, message)| *message)
    }
}

/// User-facing error raised by service functions.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// A pre-flight validation failure; no request was attempted.
    #[error("{0}")]
    Validation(String),

    /// The server rejected the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request was sent but no response arrived.
    #[error("No server response. Please check your internet connection.")]
    NoResponse,

    /// Login was rejected because the account awaits OTP verification.
    ///
    /// Carries the original credentials so the UI can enter the
    /// verification flow without re-prompting for input.
    #[error("{message}")]
    AccountNotVerified {
        message: String,
        credentials: LoginCredentials,
    },

    /// Anything else, wrapped in the operation's fallback message.
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// The HTTP status behind this error, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error carries the account-not-verified redirect context.
    pub fn is_account_not_verified(&self) -> bool {
        matches!(self, ServiceError::AccountNotVerified { .. })
    }
}

/// Classify a dispatch failure, honoring the table's silent-404 flag.
///
/// Returns `None` when the operation treats a 404 as "endpoint not
/// implemented yet"; callers translate that into an empty result.
pub fn classify(error: DispatchError, table: &MessageTable) -> Option<ServiceError> {
    if table.silent_not_found {
        if let Some(status) = error.status() {
            if status.as_u16() == 404 {
                debug!(
                    operation = table.operation,
                    "endpoint not available, treating 404 as empty result"
                );
                return None;
            }
        }
    }
    Some(classify_rejection(error, table))
}

/// Classify a dispatch failure into the operation's user-facing error.
pub fn classify_rejection(error: DispatchError, table: &MessageTable) -> ServiceError {
    match error {
        DispatchError::Status { response } => {
            let status = response.status.as_u16();
            let message = match table.message_for(status) {
                Some(text) => text.to_string(),
                None => response
                    .server_message()
                    .unwrap_or_else(|| table.fallback.to_string()),
            };
            ServiceError::Rejected { status, message }
        }
        DispatchError::NoResponse { message } => {
            debug!(operation = table.operation, error = %message, "request sent, no response");
            ServiceError::NoResponse
        }
        DispatchError::Local { message } => {
            error!(operation = table.operation, error = %message, "local request failure");
            ServiceError::Other(table.fallback.to_string())
        }
    }
}
