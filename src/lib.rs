//! # smsportal-client - Portal API service layer
//!
//! Typed client for the SMS/billing platform's administrative portal:
//! request dispatch, credential handling, failure classification and the
//! domain services (auth, documents, notifications, reports) the portal UI
//! builds on.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Portal UI                             │
//! │            (pages, hooks, data-fetching layer)               │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Services          auth · document · notification · report  │
//! │  Classifier        per-operation message tables              │
//! │  Dispatcher        envelopes, credentials, session sweep     │
//! └──────────────────────────────────────────────────────────────┘
//!                │                              │
//!                ▼                              ▼
//!        standard API (bearer)        billing API (api-key)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use smsportal_client::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ClientConfig::new()
//!         .base_url("https://api.example.com/v1")
//!         .billing_base_url("https://billing.example.com/v1");
//!
//!     let store = Arc::new(MemoryStore::new());
//!     let client = Arc::new(PortalClient::new(config, store)?);
//!
//!     let auth = AuthService::new(client.clone());
//!     let session = auth
//!         .login(LoginCredentials {
//!             identifier: "ops@example.com".to_string(),
//!             password: "hunter2!".to_string(),
//!         })
//!         .await?;
//!
//!     println!("signed in, super admin: {}", session.is_super_admin);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure classification
//!
//! Service calls fall into three buckets: the server answered with an error
//! status (mapped to an operation-specific message), the request was sent
//! but nothing answered (a fixed connectivity message), or the call failed
//! locally. Two flows step outside the generic scheme: an expired session
//! token wipes persisted state and signals a redirect to sign-in, and a
//! login rejected for pending OTP verification carries the original
//! credentials so the UI can enter the verification flow directly.

pub mod classify;
pub mod client;
pub mod http;
pub mod service;
pub mod session;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::classify::{
        classify, classify_rejection, MessageTable, ServiceError, NO_RESPONSE_MESSAGE,
    };
    pub use crate::client::{ClientConfig, DispatchError, PortalClient, RuntimeMode, Transport};
    pub use crate::http::{
        ApiRequest, ApiResponse, Credential, Method, PreparedRequest, RequestBody, StatusCode,
    };
    pub use crate::service::{
        AuthService, DocumentService, LoginCredentials, NotificationService, ReportRange,
        ReportService, SignupRequest,
    };
    pub use crate::session::{keys, MemoryStore, SessionEvents, SessionStore};
}

// Re-export for convenience
pub use classify::ServiceError;
pub use client::{ClientConfig, DispatchError, PortalClient};
pub use http::{ApiRequest, ApiResponse};
pub use session::{MemoryStore, SessionStore};
