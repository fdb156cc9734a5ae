//! Pinning service client
//!
//! Publishes binary and JSON payloads to the pinning API and returns the
//! resulting content identifiers. Publish failures propagate: issuance cannot
//! proceed without a valid reference, so this is the one layer where errors
//! must reach the caller instead of degrading.

use async_trait::async_trait;
use blockbeats_common::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Capability to publish content and receive a content identifier
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Pin a binary payload under `name`; returns the content identifier
    async fn pin_file(&self, bytes: Vec<u8>, name: &str) -> Result<String>;

    /// Pin a JSON document under `name`; returns the content identifier
    async fn pin_json(&self, content: &Value, name: &str) -> Result<String>;
}

/// HTTP client for the Pinata pinning API
pub struct PinningClient {
    client: reqwest::Client,
    api_url: String,
    jwt: String,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinningClient {
    pub fn new(api_url: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client (system error)"),
            api_url: api_url.into(),
            jwt: jwt.into(),
        }
    }

    async fn read_pin_response(response: reqwest::Response, what: &str) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Pinning {} failed with {}: {}",
                what, status, body
            )));
        }

        let parsed: PinResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse pin response: {}", e)))?;

        debug!("Pinned {}: {}", what, parsed.ipfs_hash);
        Ok(parsed.ipfs_hash)
    }
}

#[async_trait]
impl ContentPublisher for PinningClient {
    async fn pin_file(&self, bytes: Vec<u8>, name: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": name }).to_string())
            .text("pinataOptions", json!({ "cidVersion": 0 }).to_string());

        let response = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Pin file request failed: {}", e)))?;

        Self::read_pin_response(response, "file").await
    }

    async fn pin_json(&self, content: &Value, name: &str) -> Result<String> {
        let body = json!({
            "pinataOptions": { "cidVersion": 0 },
            "pinataMetadata": { "name": name },
            "pinataContent": content,
        });

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .bearer_auth(&self.jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Pin JSON request failed: {}", e)))?;

        Self::read_pin_response(response, "JSON").await
    }
}
