//! Reporting dashboards: DLR summary, transactional and promotional
//! reports served by the billing API.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

use crate::classify::{classify_rejection, MessageTable, ServiceError};
use crate::client::PortalClient;
use crate::http::{ApiRequest, Method};
use crate::session::keys;

const DLR_SUMMARY: MessageTable = MessageTable::new(
    "dlr-summary",
    &[(401, "Billing access is not authorized for this account.")],
    "Unable to load the delivery report. Please try again.",
);

const TRANSACTIONAL: MessageTable = MessageTable::new(
    "transactional-report",
    &[(401, "Billing access is not authorized for this account.")],
    "Unable to load the transactional report. Please try again.",
);

const PROMOTIONAL: MessageTable = MessageTable::new(
    "promotional-report",
    &[(401, "Billing access is not authorized for this account.")],
    "Unable to load the promotional report. Please try again.",
);

/// Inclusive date range for a report query, `YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct ReportRange {
    pub start_date: String,
    pub end_date: String,
}

impl ReportRange {
    /// Create a report range.
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

/// One day of delivery-receipt counts.
#[derive(Debug, Clone, Deserialize)]
pub struct DlrSummaryRow {
    pub date: String,
    pub delivered: u64,
    pub failed: u64,
    #[serde(default)]
    pub pending: u64,
    pub total: u64,
}

/// One transactional message.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionalRow {
    pub message_id: String,
    pub msisdn: String,
    pub status: String,
    #[serde(default)]
    pub sent_at: String,
}

/// One promotional campaign's totals.
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionalRow {
    pub campaign_id: String,
    pub sent: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Reporting service over the billing API.
pub struct ReportService {
    client: Arc<PortalClient>,
}

impl ReportService {
    /// Create a report service over a portal client.
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// Daily DLR summary for the given range.
    pub async fn dlr_summary(&self, range: &ReportRange) -> Result<Vec<DlrSummaryRow>, ServiceError> {
        self.fetch_rows("/reports/dlr-summary", range, &DLR_SUMMARY)
            .await
    }

    /// Transactional messages sent in the given range.
    pub async fn transactional(
        &self,
        range: &ReportRange,
    ) -> Result<Vec<TransactionalRow>, ServiceError> {
        self.fetch_rows("/reports/transactional", range, &TRANSACTIONAL)
            .await
    }

    /// Promotional campaign totals for the given range.
    pub async fn promotional(
        &self,
        range: &ReportRange,
    ) -> Result<Vec<PromotionalRow>, ServiceError> {
        self.fetch_rows("/reports/promotional", range, &PROMOTIONAL)
            .await
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        range: &ReportRange,
        table: &MessageTable,
    ) -> Result<Vec<T>, ServiceError> {
        let mut request = ApiRequest::new(Method::Get, endpoint)
            .query("start_date", &range.start_date)
            .query("end_date", &range.end_date);
        if let Some(key) = self.client.store().get(keys::API_KEY).await {
            request = request.api_key(key);
        }

        match self.client.send_billing(request).await {
            Ok(response) => match response.data() {
                Some(Ok(rows)) => Ok(rows),
                _ => Err(ServiceError::Other(table.fallback.to_string())),
            },
            Err(err) => Err(classify_rejection(err, table)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use crate::client::ClientConfig;
    use crate::http::API_KEY_HEADER;
    use crate::session::{MemoryStore, SessionStore};

    fn service(transport: Arc<MockTransport>) -> (ReportService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(PortalClient::with_transport(
            ClientConfig::new()
                .base_url("http://api.local")
                .billing_base_url("http://billing.local"),
            store.clone(),
            transport,
        ));
        (ReportService::new(client), store)
    }

    #[tokio::test]
    async fn dlr_summary_queries_the_billing_api_with_the_api_key() {
        let transport = MockTransport::new();
        transport
            .push_ok(
                200,
                r#"[{"date":"2024-05-01","delivered":120,"failed":3,"total":123}]"#,
            )
            .await;
        let (reports, store) = service(transport.clone());
        store.set(keys::API_KEY, "k").await.unwrap();

        let rows = reports
            .dlr_summary(&ReportRange::new("2024-05-01", "2024-05-31"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].delivered, 120);

        let calls = transport.calls().await;
        assert_eq!(calls[0].url, "http://billing.local/reports/dlr-summary");
        assert_eq!(calls[0].header(API_KEY_HEADER), Some("k"));
        assert_eq!(
            calls[0].query,
            vec![
                ("start_date".to_string(), "2024-05-01".to_string()),
                ("end_date".to_string(), "2024-05-31".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn missing_api_key_sends_no_credential_header() {
        let transport = MockTransport::new();
        transport.push_ok(200, "[]").await;
        let (reports, _) = service(transport.clone());

        reports
            .transactional(&ReportRange::new("2024-05-01", "2024-05-31"))
            .await
            .unwrap();

        let calls = transport.calls().await;
        assert!(calls[0].header(API_KEY_HEADER).is_none());
        assert!(calls[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn unauthorized_billing_access_maps_the_table_message() {
        let transport = MockTransport::new();
        transport.push_ok(401, "{}").await;
        let (reports, _) = service(transport);

        let err = reports
            .promotional(&ReportRange::new("2024-05-01", "2024-05-31"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Billing access is not authorized for this account."
        );
    }
}
