//! Request dispatcher for the portal APIs.
//!
//! Translates request envelopes into transport calls and normalizes the
//! results. Classification of failures into user-facing messages happens at
//! the service layer; the dispatcher only owns the two side channels that
//! must run on every call: credential sanitization for diagnostics and the
//! expired-session sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::classify::session_expired;
use crate::client::config::{ClientConfig, RuntimeMode};
use crate::client::error::DispatchError;
use crate::client::transport::{ReqwestTransport, Transport};
use crate::http::{
    ApiRequest, ApiResponse, PreparedRequest, RequestSummary, API_KEY_HEADER, AUTHORIZATION_HEADER,
};
use crate::session::{NoopEvents, SessionEvents, SessionStore};

/// Client for the portal's standard and billing APIs.
pub struct PortalClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    events: Arc<dyn SessionEvents>,
}

impl PortalClient {
    /// Create a client backed by a real HTTP transport.
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, DispatchError> {
        let timeout = Duration::from_secs(config.request_timeout.max(1));
        let transport = Arc::new(ReqwestTransport::new(timeout)?);
        Ok(Self::with_transport(config, store, transport))
    }

    /// Create a client with an explicit transport.
    pub fn with_transport(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            events: Arc::new(NoopEvents),
        }
    }

    /// Set the session event hook.
    pub fn events(mut self, events: Arc<dyn SessionEvents>) -> Self {
        self.events = events;
        self
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session store backing this client.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// Dispatch a request against the standard API.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, DispatchError> {
        self.dispatch(request, &self.config.base_url).await
    }

    /// Dispatch a request against the billing/admin API.
    pub async fn send_billing(&self, request: ApiRequest) -> Result<ApiResponse, DispatchError> {
        self.dispatch(request, &self.config.billing_base_url).await
    }

    /// Execute an already-prepared request without envelope processing.
    ///
    /// Used for presigned uploads, where headers are governed by the URL
    /// signature and must not be touched.
    pub async fn execute_raw(
        &self,
        prepared: PreparedRequest,
    ) -> Result<ApiResponse, DispatchError> {
        let summary = self.summarize(&prepared);
        debug!(method = %prepared.method, url = %summary.url, "executing raw request");

        let mut response = self.transport.execute(prepared).await?;
        response.request = Some(summary);
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(DispatchError::Status { response })
        }
    }

    async fn dispatch(
        &self,
        request: ApiRequest,
        base_url: &str,
    ) -> Result<ApiResponse, DispatchError> {
        let prepared = request.prepare(base_url);
        let summary = self.summarize(&prepared);
        debug!(method = %prepared.method, url = %summary.url, "dispatching request");

        let mut response = self.transport.execute(prepared).await?;
        response.request = Some(summary);

        if response.status.is_success() {
            return Ok(response);
        }

        self.sweep_expired_session(&response).await;
        Err(DispatchError::Status { response })
    }

    /// Build the sanitized request summary carried for diagnostics.
    fn summarize(&self, prepared: &PreparedRequest) -> RequestSummary {
        RequestSummary {
            method: prepared.method,
            url: prepared.url.clone(),
            headers: sanitize_headers(&prepared.headers, self.config.mode),
        }
    }

    /// Clear persisted session state when the server reports an expired
    /// token.
    ///
    /// Cleanup is best effort: a failing store is logged and ignored so the
    /// redirect signal always fires. The original failure still propagates
    /// to the caller afterwards.
    async fn sweep_expired_session(&self, response: &ApiResponse) {
        let message = response
            .server_message()
            .or_else(|| response.text())
            .unwrap_or_default();
        if !session_expired(&message) {
            return;
        }

        warn!(status = %response.status, "session token expired, clearing persisted state");
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear session state");
        }
        self.events
            .on_session_expired(&self.config.sign_in_route)
            .await;
    }
}

/// Mask or remove credential header values for diagnostic surfaces.
pub fn sanitize_headers(
    headers: &HashMap<String, String>,
    mode: RuntimeMode,
) -> HashMap<String, String> {
    let mut sanitized = HashMap::new();
    for (name, value) in headers {
        let sensitive = name.eq_ignore_ascii_case(AUTHORIZATION_HEADER)
            || name.eq_ignore_ascii_case(API_KEY_HEADER);
        if !sensitive {
            sanitized.insert(name.clone(), value.clone());
            continue;
        }
        match mode {
            RuntimeMode::Development => {
                sanitized.insert(name.clone(), "***".to_string());
            }
            RuntimeMode::Production => {}
        }
    }
    sanitized
}
