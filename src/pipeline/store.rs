//! Record persistence: one row per analysed upload.
//!
//! [`RecordStore`] is the seam the pipeline depends on. [`SupabaseStore`]
//! implements it as a PostgREST insert against a Supabase project:
//!
//! ```text
//! POST {url}/rest/v1/{table}
//! apikey: {key}
//! Authorization: Bearer {key}
//! Prefer: return=minimal
//!
//! {"filename": ..., "created_at": ..., "raw_text": ..., "flags": ...}
//! ```
//!
//! Inserts are independent and non-transactional. There is no dedup key;
//! two identical uploads produce two rows.

use crate::config::StoreConfig;
use crate::error::{IngestError, StoreError};
use crate::output::ContractRecord;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Durable sink for contract records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record. Either the row is stored or an error is returned.
    async fn insert(&self, record: &ContractRecord) -> Result<(), StoreError>;
}

/// [`RecordStore`] backed by the Supabase REST API.
///
/// Holds one pooled `reqwest::Client` reused by every request.
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl SupabaseStore {
    /// Build a store from validated settings.
    pub fn new(config: &StoreConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IngestError::PersistenceFailed {
                source: StoreError::Transport(e.to_string()),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", config.url, config.table),
            key: config.key.clone(),
        })
    }

    /// Build a store from `SUPABASE_URL` / `SUPABASE_KEY`.
    ///
    /// Fails with [`IngestError::ConfigurationMissing`] when either is unset.
    pub fn from_env() -> Result<Self, IngestError> {
        Self::new(&StoreConfig::from_env()?)
    }

    /// Full insert URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn insert(&self, record: &ContractRecord) -> Result<(), StoreError> {
        let body = serde_json::to_vec(record)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Failed to read store error body: {}", e);
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Inserted record for '{}' (HTTP {})", record.filename, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_targets_rest_table() {
        let config = StoreConfig::new(
            Some("https://abc.supabase.co/".into()),
            Some("service-key".into()),
        )
        .unwrap();
        let store = SupabaseStore::new(&config).unwrap();
        assert_eq!(store.endpoint(), "https://abc.supabase.co/rest/v1/contracts");

        let store = SupabaseStore::new(&config.with_table("vendor_contracts")).unwrap();
        assert!(store.endpoint().ends_with("/rest/v1/vendor_contracts"));
    }

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn record() -> ContractRecord {
        ContractRecord {
            filename: "a.pdf".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            raw_text: String::new(),
            flags: crate::output::Flags::Raw { raw: String::new() },
        }
    }

    /// Serve one connection with a canned HTTP response, then close it.
    async fn one_shot_server(response: &'static str) -> SupabaseStore {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        let config = StoreConfig::new(Some(format!("http://{addr}")), Some("k".into())).unwrap();
        SupabaseStore::new(&config).unwrap()
    }

    #[tokio::test]
    async fn unreachable_store_is_a_transport_error() {
        // Nothing listens on the local discard port.
        let config =
            StoreConfig::new(Some("http://127.0.0.1:9".into()), Some("k".into())).unwrap();
        let store = SupabaseStore::new(&config).unwrap();
        let err = store.insert(&record()).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_with_body() {
        let store = one_shot_server(
            "HTTP/1.1 409 Conflict\r\nContent-Length: 9\r\nConnection: close\r\n\r\nduplicate",
        )
        .await;
        let err = store.insert(&record()).await.unwrap_err();
        match err {
            StoreError::Rejected { status, body } => {
                assert_eq!(status, 409);
                assert_eq!(body, "duplicate");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_error_body_is_reported_not_dropped() {
        // Promises 100 bytes, sends 5, then closes.
        let store = one_shot_server(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
        )
        .await;
        let err = store.insert(&record()).await.unwrap_err();
        match err {
            StoreError::Rejected { status, body } => {
                assert_eq!(status, 500);
                assert!(body.starts_with("<unreadable body"), "got {body:?}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
