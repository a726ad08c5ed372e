//! Verification documents: records, presigned uploads and the proxy
//! fallback.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::classify::{classify_rejection, MessageTable, ServiceError};
use crate::client::{DispatchError, PortalClient};
use crate::http::{ApiRequest, Method, PreparedRequest, RequestBody};
use crate::session::keys;

const CREATE_DOCUMENT: MessageTable = MessageTable::new(
    "create-document",
    &[
        (401, "Your session is not authorized. Please sign in again."),
        (409, "A document of this type is already awaiting verification"),
        (
            422,
            "The document could not be processed. Please check the file and try again.",
        ),
        (500, "Something went wrong on our end. Please try again later."),
    ],
    "Unable to submit the document. Please try again.",
);

const LIST_DOCUMENTS: MessageTable = MessageTable::new(
    "list-documents",
    &[(401, "Your session is not authorized. Please sign in again.")],
    "Unable to load documents. Please try again.",
);

const DELETE_DOCUMENT: MessageTable = MessageTable::new(
    "delete-document",
    &[(404, "Document not found")],
    "Unable to delete the document. Please try again.",
);

const UPLOAD_URL: MessageTable = MessageTable::new(
    "request-upload-url",
    &[],
    "Unable to prepare the upload. Please try again.",
);

const UPLOAD: MessageTable = MessageTable::new(
    "upload-file",
    &[],
    "Unable to upload the file. Please try again.",
);

/// Input for registering an uploaded document.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDocument {
    pub file_name: String,
    pub document_type: String,
    /// Object-storage key returned by the upload-url endpoint.
    pub storage_key: String,
}

/// A document known to the verification backend.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub file_name: String,
    pub document_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Presigned upload destination.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTarget {
    pub upload_url: String,
    #[serde(default)]
    pub storage_key: String,
}

/// Document service.
pub struct DocumentService {
    client: Arc<PortalClient>,
}

impl DocumentService {
    /// Create a document service over a portal client.
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// Register an uploaded document for verification.
    pub async fn create_document(&self, input: CreateDocument) -> Result<DocumentRecord, ServiceError> {
        let request = ApiRequest::new(Method::Post, "/documents")
            .json(&input)
            .map_err(|err| {
                classify_rejection(
                    DispatchError::Local {
                        message: err.to_string(),
                    },
                    &CREATE_DOCUMENT,
                )
            })?;
        let request = self.authed(request).await;

        match self.client.send(request).await {
            Ok(response) => match response.data() {
                Some(Ok(record)) => Ok(record),
                _ => Err(ServiceError::Other(CREATE_DOCUMENT.fallback.to_string())),
            },
            Err(err) => Err(classify_rejection(err, &CREATE_DOCUMENT)),
        }
    }

    /// List the signed-in account's documents.
    pub async fn list_documents(&self) -> Result<Vec<DocumentRecord>, ServiceError> {
        let request = self.authed(ApiRequest::new(Method::Get, "/documents")).await;

        match self.client.send(request).await {
            Ok(response) => match response.data() {
                Some(Ok(records)) => Ok(records),
                _ => Err(ServiceError::Other(LIST_DOCUMENTS.fallback.to_string())),
            },
            Err(err) => Err(classify_rejection(err, &LIST_DOCUMENTS)),
        }
    }

    /// Delete a document by id.
    pub async fn delete_document(&self, id: i64) -> Result<(), ServiceError> {
        let request = self
            .authed(ApiRequest::new(Method::Delete, "/documents").id(id))
            .await;

        match self.client.send(request).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &DELETE_DOCUMENT)),
        }
    }

    /// Ask the backend for a presigned upload destination.
    pub async fn request_upload_url(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadTarget, ServiceError> {
        let request = self
            .authed(
                ApiRequest::new(Method::Get, "/documents/upload-url")
                    .query("file_name", file_name)
                    .query("content_type", content_type),
            )
            .await;

        match self.client.send(request).await {
            Ok(response) => match response.data() {
                Some(Ok(target)) => Ok(target),
                _ => Err(ServiceError::Other(UPLOAD_URL.fallback.to_string())),
            },
            Err(err) => Err(classify_rejection(err, &UPLOAD_URL)),
        }
    }

    /// Upload a file's raw bytes to a presigned object-storage URL.
    ///
    /// `Content-Type` is attached only when the URL's signature covers that
    /// header; any other header would invalidate the signature. Certificate
    /// failures fall back to the same-origin multipart proxy; other
    /// failures surface as upload errors.
    pub async fn upload_file(
        &self,
        presigned_url: &str,
        file_name: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), ServiceError> {
        let mut headers = HashMap::new();
        if presigned_covers_content_type(presigned_url)? {
            headers.insert("Content-Type".to_string(), content_type.to_string());
        }
        let prepared = PreparedRequest {
            method: Method::Put,
            url: presigned_url.to_string(),
            headers,
            query: Vec::new(),
            body: RequestBody::Raw(content.clone()),
        };

        match self.client.execute_raw(prepared).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_certificate_error() => {
                warn!("direct upload failed certificate validation, retrying through the proxy");
                self.upload_via_proxy(file_name, content, content_type).await
            }
            Err(err) => Err(classify_rejection(err, &UPLOAD)),
        }
    }

    /// Route an upload through the same-origin proxy as multipart form data.
    async fn upload_via_proxy(
        &self,
        file_name: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), ServiceError> {
        let config = self.client.config();
        let path = if config.upload_proxy_path.starts_with('/') {
            config.upload_proxy_path.clone()
        } else {
            format!("/{}", config.upload_proxy_path)
        };
        let url = format!("{}{}", config.base_url.trim_end_matches('/'), path);

        let prepared = PreparedRequest {
            method: Method::Post,
            url,
            headers: HashMap::new(),
            query: Vec::new(),
            body: RequestBody::Multipart {
                field: "file".to_string(),
                file_name: file_name.to_string(),
                content,
                mime: content_type.to_string(),
            },
        };

        match self.client.execute_raw(prepared).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &UPLOAD)),
        }
    }

    async fn authed(&self, request: ApiRequest) -> ApiRequest {
        match self.client.store().get(keys::AUTH_TOKEN).await {
            Some(token) => request.bearer(token),
            None => request,
        }
    }
}

/// Whether a presigned URL's signature covers the `Content-Type` header.
///
/// Reads the `X-Amz-SignedHeaders` query parameter, a `;`-separated list of
/// lower-cased header names.
pub fn presigned_covers_content_type(presigned_url: &str) -> Result<bool, ServiceError> {
    let parsed = Url::parse(presigned_url)
        .map_err(|_| ServiceError::Validation("Upload URL is invalid.".to_string()))?;
    for (name, value) in parsed.query_pairs() {
        if name.eq_ignore_ascii_case("x-amz-signedheaders") {
            return Ok(value
                .split(';')
                .any(|header| header.trim().eq_ignore_ascii_case("content-type")));
        }
    }
    Ok(false)
}
