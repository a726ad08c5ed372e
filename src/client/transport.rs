//! Transport seam between the dispatcher and the HTTP client.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::client::error::DispatchError;
use crate::http::{ApiResponse, Method, PreparedRequest, RequestBody, StatusCode};

/// Executes a prepared request against the network.
///
/// The production implementation wraps a [`reqwest::Client`]; tests swap in
/// a recording double so service behavior can be checked without sockets.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single request and return the raw response envelope.
    ///
    /// Non-2xx responses are returned as `Ok`; the dispatcher decides how
    /// they surface.
    async fn execute(&self, request: PreparedRequest) -> Result<ApiResponse, DispatchError>;
}

/// [`reqwest`]-backed transport.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DispatchError::Local {
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<ApiResponse, DispatchError> {
        let mut builder = self
            .http
            .request(reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Raw(content) => builder.body(content),
            RequestBody::Multipart {
                field,
                file_name,
                content,
                mime,
            } => {
                let part = reqwest::multipart::Part::bytes(content.to_vec())
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|err| DispatchError::Local {
                        message: format!("invalid upload content type: {err}"),
                    })?;
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        let response = builder.send().await.map_err(map_send_error)?;

        let status = StatusCode(response.status().as_u16());
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_string(), v.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| DispatchError::Local {
                message: format!("failed to read response body: {err}"),
            })?;

        Ok(ApiResponse {
            status,
            status_text,
            headers,
            body: if body.is_empty() { None } else { Some(body) },
            request: None,
        })
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

/// Map a send failure onto the dispatch taxonomy.
///
/// Timeouts and connection failures mean the request left the client and
/// nothing answered; everything else stays a local error.
fn map_send_error(err: reqwest::Error) -> DispatchError {
    if err.is_timeout() || err.is_connect() {
        DispatchError::NoResponse {
            message: err.to_string(),
        }
    } else {
        DispatchError::Local {
            message: err.to_string(),
        }
    }
}
