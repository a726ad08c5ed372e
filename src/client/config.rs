//! Dispatcher configuration.

/// Runtime mode, controlling how aggressively diagnostics are sanitized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Credential header values are masked in diagnostics.
    #[default]
    Development,
    /// Credential headers are removed from diagnostics outright.
    Production,
}

/// Configuration for the portal API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the standard (bearer-token) API.
    pub base_url: String,
    /// Base URL of the billing/admin (API-key) API.
    pub billing_base_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Runtime mode.
    pub mode: RuntimeMode,
    /// Route the UI is sent to when the session expires.
    pub sign_in_route: String,
    /// Same-origin path used as the fallback upload proxy.
    pub upload_proxy_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            billing_base_url: "http://localhost:8080/billing/v1".to_string(),
            request_timeout: 30,
            mode: RuntimeMode::default(),
            sign_in_route: "/signin".to_string(),
            upload_proxy_path: "/api/upload-proxy".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the standard API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the billing API base URL.
    pub fn billing_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.billing_base_url = base_url.into();
        self
    }

    /// Set the request timeout in seconds.
    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = seconds;
        self
    }

    /// Set the runtime mode.
    pub fn mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the sign-in route used on session expiry.
    pub fn sign_in_route(mut self, route: impl Into<String>) -> Self {
        self.sign_in_route = route.into();
        self
    }

    /// Set the fallback upload proxy path.
    pub fn upload_proxy_path(mut self, path: impl Into<String>) -> Self {
        self.upload_proxy_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = ClientConfig::new()
            .base_url("https://api.example.com/v1")
            .billing_base_url("https://billing.example.com/v1")
            .request_timeout(5)
            .mode(RuntimeMode::Production)
            .sign_in_route("/login");

        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.billing_base_url, "https://billing.example.com/v1");
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.mode, RuntimeMode::Production);
        assert_eq!(config.sign_in_route, "/login");
        assert_eq!(config.upload_proxy_path, "/api/upload-proxy");
    }
}
