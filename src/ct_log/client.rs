// src/ct_log/client.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{
    GetConsistencyResponse, GetEntriesResponse, GetSthResponse, LeafEntry, SignedTreeHead,
};
use crate::merkle::ConsistencyProof;

/// Read side of the RFC 6962 log API used by the scanner
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Fetch entries `start..=end`; the log may return fewer than requested
    async fn get_entries(&self, start: u64, end: u64) -> Result<Vec<LeafEntry>>;

    /// Fetch the log's current signed tree head
    async fn get_sth(&self) -> Result<SignedTreeHead>;

    /// Fetch a consistency proof between two tree sizes, `first < second`
    async fn get_consistency_proof(&self, first: u64, second: u64) -> Result<ConsistencyProof>;
}

/// HTTP client for Certificate Transparency log RFC 6962 API
pub struct CtLogClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CtLogClient {
    /// Create a new CT log client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited by CT log: {}", self.base_url);
                anyhow::bail!("Rate limited (429)");
            }

            anyhow::bail!("{} request failed with status {}: {}", what, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} JSON", what))
    }
}

#[async_trait]
impl LogClient for CtLogClient {
    /// Endpoint: GET {base_url}/ct/v1/get-entries?start={start}&end={end}
    async fn get_entries(&self, start: u64, end: u64) -> Result<Vec<LeafEntry>> {
        let url = format!(
            "{}/ct/v1/get-entries?start={}&end={}",
            self.base_url, start, end
        );

        debug!("Fetching entries {}-{} from {}", start, end, self.base_url);

        let response: GetEntriesResponse = self.get_json(&url, "entries").await?;

        debug!(
            "Received {} entries from {}",
            response.entries.len(),
            self.base_url
        );

        response
            .entries
            .into_iter()
            .enumerate()
            .map(|(offset, raw)| {
                LeafEntry::try_from(raw)
                    .with_context(|| format!("Malformed entry {}", start + offset as u64))
            })
            .collect()
    }

    /// Endpoint: GET {base_url}/ct/v1/get-sth
    async fn get_sth(&self) -> Result<SignedTreeHead> {
        let url = format!("{}/ct/v1/get-sth", self.base_url);

        debug!("Fetching STH from {}", url);

        let raw: GetSthResponse = self.get_json(&url, "STH").await?;
        let sth = SignedTreeHead::try_from(raw).context("Malformed STH")?;

        debug!(
            "STH received: tree_size={}, timestamp={}",
            sth.tree_size, sth.timestamp
        );

        Ok(sth)
    }

    /// Endpoint: GET {base_url}/ct/v1/get-sth-consistency?first={first}&second={second}
    async fn get_consistency_proof(&self, first: u64, second: u64) -> Result<ConsistencyProof> {
        let url = format!(
            "{}/ct/v1/get-sth-consistency?first={}&second={}",
            self.base_url, first, second
        );

        debug!("Fetching consistency proof {} -> {} from {}", first, second, self.base_url);

        let response: GetConsistencyResponse = self.get_json(&url, "consistency proof").await?;
        response.into_proof().context("Malformed consistency proof")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_sth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ct/v1/get-sth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tree_size": 5,
                "timestamp": 1600000000000u64,
                "sha256_root_hash": STANDARD.encode([3u8; 32]),
                "tree_head_signature": STANDARD.encode([4u8, 3, 0, 0]),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CtLogClient::new(format!("{}/", server.uri())).unwrap();
        let sth = client.get_sth().await.unwrap();
        assert_eq!(sth.tree_size, 5);
        assert_eq!(sth.root_hash, [3u8; 32]);
        assert_eq!(sth.signature, vec![4, 3, 0, 0]);
    }

    #[tokio::test]
    async fn test_get_entries_decodes_base64() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ct/v1/get-entries"))
            .and(query_param("start", "10"))
            .and(query_param("end", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "entries": [
                    { "leaf_input": STANDARD.encode(b"a"), "extra_data": "" },
                    { "leaf_input": STANDARD.encode(b"b"), "extra_data": STANDARD.encode(b"chain") },
                ]
            })))
            .mount(&server)
            .await;

        let client = CtLogClient::new(server.uri()).unwrap();
        let entries = client.get_entries(10, 12).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].leaf_input, b"a");
        assert_eq!(entries[1].extra_data, b"chain");
    }

    #[tokio::test]
    async fn test_get_consistency_proof() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ct/v1/get-sth-consistency"))
            .and(query_param("first", "3"))
            .and(query_param("second", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "consistency": [STANDARD.encode([1u8; 32]), STANDARD.encode([2u8; 32])]
            })))
            .mount(&server)
            .await;

        let client = CtLogClient::new(server.uri()).unwrap();
        let proof = client.get_consistency_proof(3, 7).await.unwrap();
        assert_eq!(proof, vec![[1u8; 32], [2u8; 32]]);
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ct/v1/get-entries"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = CtLogClient::new(server.uri()).unwrap();
        let err = client.get_entries(0, 9).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_server_error_includes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ct/v1/get-sth"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let client = CtLogClient::new(server.uri()).unwrap();
        let err = client.get_sth().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("backend down"));
    }
}
