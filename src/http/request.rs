//! Outbound request envelope with a fetch-like builder API.

use bytes::Bytes;
use std::collections::HashMap;

/// HTTP method enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
            Method::Patch => write!(f, "PATCH"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
        }
    }
}

/// Credential attached to a single call.
///
/// Standard endpoints authenticate with a bearer token, billing and admin
/// endpoints with an API key. A call carries at most one of the two; when no
/// credential is supplied the corresponding header is omitted entirely rather
/// than sent with an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    ApiKey(String),
}

/// Header name used for API-key authentication.
pub const API_KEY_HEADER: &str = "api-key";

/// Header name used for bearer-token authentication.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Fetch-like request envelope built by service functions.
///
/// `ApiRequest` collects the caller's intent (method, endpoint, optional
/// resource id, body, query, credential) and resolves it into a
/// [`PreparedRequest`] via [`ApiRequest::prepare`]. The resolution step owns
/// endpoint normalization and credential header injection, so every service
/// goes through the same rules.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint path, normalized to a single leading slash at prepare time.
    pub endpoint: String,
    /// Optional resource id, appended to the endpoint as `/{id}`.
    pub id: Option<String>,
    /// Query parameters, string-coerced.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
    /// Optional credential for this call.
    pub credential: Option<Credential>,
}

impl ApiRequest {
    /// Create a new request envelope.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            id: None,
            query: Vec::new(),
            body: None,
            credential: None,
        }
    }

    /// Append a resource id to the endpoint path.
    pub fn id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set a JSON body from any serializable payload.
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    /// Set a raw JSON value as the body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a bearer token credential.
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(Credential::Bearer(token.into()));
        self
    }

    /// Attach an API-key credential.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.credential = Some(Credential::ApiKey(key.into()));
        self
    }

    /// Resolve the envelope against a base URL.
    ///
    /// The endpoint is normalized to begin with a leading slash before it is
    /// joined to the base URL; the `/{id}` suffix is appended after that and
    /// is never re-normalized. Absolute (`http://` or `https://`) endpoints
    /// bypass the base URL entirely.
    pub fn prepare(&self, base_url: &str) -> PreparedRequest {
        let url = if self.endpoint.contains("://") {
            match &self.id {
                Some(id) => format!("{}/{id}", self.endpoint),
                None => self.endpoint.clone(),
            }
        } else {
            let mut path = if self.endpoint.starts_with('/') {
                self.endpoint.clone()
            } else {
                format!("/{}", self.endpoint)
            };
            if let Some(id) = &self.id {
                path = format!("{path}/{id}");
            }
            format!("{}{}", base_url.trim_end_matches('/'), path)
        };

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        match &self.credential {
            Some(Credential::Bearer(token)) => {
                headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"));
            }
            Some(Credential::ApiKey(key)) => {
                headers.insert(API_KEY_HEADER.to_string(), key.clone());
            }
            None => {}
        }

        let body = match &self.body {
            Some(value) => RequestBody::Json(value.clone()),
            None => RequestBody::Empty,
        };

        PreparedRequest {
            method: self.method,
            url,
            headers,
            query: self.query.clone(),
            body,
        }
    }
}

/// Body of a prepared request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON payload, serialized by the transport.
    Json(serde_json::Value),
    /// Raw bytes, sent as-is (presigned object-storage uploads).
    Raw(Bytes),
    /// Multipart form upload with a single file part.
    Multipart {
        field: String,
        file_name: String,
        content: Bytes,
        mime: String,
    },
}

/// A fully resolved request, ready for the transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl PreparedRequest {
    /// Get a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
