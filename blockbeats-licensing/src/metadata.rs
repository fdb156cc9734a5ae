//! Off-chain metadata resolution
//!
//! Reads license metadata documents through a public gateway. Metadata is
//! decoration: any failure here resolves to an empty document so a dead
//! gateway or a garbage upload can never invalidate the on-chain record.

use async_trait::async_trait;
use blockbeats_common::LicenseMetadata;
use tracing::warn;

/// Capability to resolve a content identifier into a metadata document
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch and parse the document behind `content_ref`. Never fails;
    /// returns the empty document on any error.
    async fn resolve(&self, content_ref: &str) -> LicenseMetadata;
}

/// Gateway-backed metadata resolver
pub struct MetadataResolver {
    client: reqwest::Client,
    gateway_url: String,
}

impl MetadataResolver {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client (system error)"),
            gateway_url: gateway_url.into(),
        }
    }

    /// Public URL for a pinned payload (audio and cover art previews use this)
    pub fn gateway_url(&self, content_ref: &str) -> String {
        format!("{}/ipfs/{}", self.gateway_url, content_ref)
    }
}

#[async_trait]
impl MetadataSource for MetadataResolver {
    async fn resolve(&self, content_ref: &str) -> LicenseMetadata {
        let url = self.gateway_url(content_ref);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Metadata fetch failed for {}: {}", content_ref, e);
                return LicenseMetadata::default();
            }
        };

        if !response.status().is_success() {
            warn!(
                "Metadata fetch for {} returned {}",
                content_ref,
                response.status()
            );
            return LicenseMetadata::default();
        }

        match response.json::<LicenseMetadata>().await {
            Ok(document) => document,
            Err(e) => {
                warn!("Malformed metadata document for {}: {}", content_ref, e);
                LicenseMetadata::default()
            }
        }
    }
}
