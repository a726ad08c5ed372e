//! In-app notifications.
//!
//! The notification endpoints are still being rolled out server-side, so
//! the read paths treat a 404 as "nothing here yet" instead of an error.

use serde::Deserialize;
use std::sync::Arc;

use crate::classify::{classify, classify_rejection, MessageTable, ServiceError};
use crate::client::PortalClient;
use crate::http::{ApiRequest, Method};
use crate::session::keys;

const LIST_NOTIFICATIONS: MessageTable = MessageTable::new(
    "list-notifications",
    &[],
    "Unable to load notifications. Please try again.",
)
.silent_not_found();

const MARK_READ: MessageTable = MessageTable::new(
    "mark-notification-read",
    &[],
    "Unable to update the notification. Please try again.",
)
.silent_not_found();

const DELETE_NOTIFICATION: MessageTable = MessageTable::new(
    "delete-notification",
    &[(404, "Notification not found")],
    "Unable to delete the notification. Please try again.",
);

/// A notification shown in the portal header.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub read: bool,
}

/// Notification service.
pub struct NotificationService {
    client: Arc<PortalClient>,
}

impl NotificationService {
    /// Create a notification service over a portal client.
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// Fetch the signed-in account's notifications.
    ///
    /// Returns `Ok(None)` when the endpoint is not deployed yet.
    pub async fn list_notifications(&self) -> Result<Option<Vec<Notification>>, ServiceError> {
        let request = self
            .authed(ApiRequest::new(Method::Get, "/notifications"))
            .await;

        match self.client.send(request).await {
            Ok(response) => match response.data() {
                Some(Ok(items)) => Ok(Some(items)),
                _ => Err(ServiceError::Other(
                    LIST_NOTIFICATIONS.fallback.to_string(),
                )),
            },
            Err(err) => match classify(err, &LIST_NOTIFICATIONS) {
                Some(err) => Err(err),
                None => Ok(None),
            },
        }
    }

    /// Mark a notification as read.
    ///
    /// Returns `Ok(None)` when the endpoint is not deployed yet.
    pub async fn mark_read(&self, id: i64) -> Result<Option<()>, ServiceError> {
        let request = self
            .authed(
                ApiRequest::new(Method::Patch, "/notifications")
                    .id(id)
                    .body(serde_json::json!({ "read": true })),
            )
            .await;

        match self.client.send(request).await {
            Ok(_) => Ok(Some(())),
            Err(err) => match classify(err, &MARK_READ) {
                Some(err) => Err(err),
                None => Ok(None),
            },
        }
    }

    /// Delete a notification by id.
    pub async fn delete_notification(&self, id: i64) -> Result<(), ServiceError> {
        let request = self
            .authed(ApiRequest::new(Method::Delete, "/notifications").id(id))
            .await;

        match self.client.send(request).await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_rejection(err, &DELETE_NOTIFICATION)),
        }
    }

    async fn authed(&self, request: ApiRequest) -> ApiRequest {
        match self.client.store().get(keys::AUTH_TOKEN).await {
            Some(token) => request.bearer(token),
            None => request,
        }
    }
}
