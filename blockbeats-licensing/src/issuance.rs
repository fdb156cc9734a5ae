//! License issuance flow
//!
//! Linear pipeline with a hard order dependency: audio upload, optional image
//! upload, metadata document assembly and upload, then the issuance
//! transaction. Each step consumes the previous step's output, so a failed
//! publish short-circuits the chain and the irrevocable on-chain write is
//! never reached. Pinned-but-unreferenced files from a partial run are an
//! accepted side effect; no compensation is attempted.

use crate::pinning::ContentPublisher;
use blockbeats_chain::LicenseContract;
use blockbeats_common::{Address, Error, LicenseMetadata, LicenseType, Result};
use std::sync::Arc;
use tracing::info;

/// One uploadable payload
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl FilePayload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self { bytes, file_name: file_name.into() }
    }
}

/// Everything the issuance form collects
#[derive(Debug, Clone)]
pub struct IssuanceRequest {
    pub licensee: Address,
    pub license_type: LicenseType,
    pub duration_days: u64,
    pub title: String,
    pub artist: String,
    pub description: String,
    pub terms: String,
    /// Primary audio payload; required
    pub audio: Option<FilePayload>,
    /// Cover art; skipped silently when absent
    pub image: Option<FilePayload>,
}

/// References produced by a completed issuance
#[derive(Debug, Clone)]
pub struct IssuanceOutcome {
    pub license_id: u64,
    pub transaction_hash: String,
    pub metadata_ref: String,
    pub audio_ref: String,
    /// Empty when no image was provided
    pub image_ref: String,
}

/// Drives the publish → assemble → publish → transact pipeline
pub struct IssuanceFlow {
    contract: Arc<LicenseContract>,
    publisher: Arc<dyn ContentPublisher>,
}

impl IssuanceFlow {
    pub fn new(contract: Arc<LicenseContract>, publisher: Arc<dyn ContentPublisher>) -> Self {
        Self { contract, publisher }
    }

    /// Run the full pipeline. The transaction in the final step is the only
    /// irrevocable action; everything before it is safe to re-run.
    pub async fn issue(&self, from: &Address, request: IssuanceRequest) -> Result<IssuanceOutcome> {
        let audio = request
            .audio
            .ok_or_else(|| Error::InvalidInput("An audio file is required to issue a license".to_string()))?;

        let audio_ref = self.publisher.pin_file(audio.bytes, &audio.file_name).await?;

        let image_ref = match request.image {
            Some(image) => self.publisher.pin_file(image.bytes, &image.file_name).await?,
            None => String::new(),
        };

        let document = LicenseMetadata {
            title: Some(request.title),
            artist: Some(request.artist),
            description: Some(request.description),
            audio_hash: Some(audio_ref.clone()),
            image_hash: Some(image_ref.clone()),
            terms: Some(request.terms),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        let content = serde_json::to_value(&document)
            .map_err(|e| Error::Internal(format!("Failed to serialize metadata document: {}", e)))?;

        let metadata_ref = self.publisher.pin_json(&content, "metadata.json").await?;

        let issued = self
            .contract
            .issue_license(
                from,
                &request.licensee,
                request.license_type,
                request.duration_days,
                &metadata_ref,
            )
            .await?;

        info!(
            "License {} issued to {} ({} days, metadata {})",
            issued.license_id, request.licensee, request.duration_days, metadata_ref
        );

        Ok(IssuanceOutcome {
            license_id: issued.license_id,
            transaction_hash: issued.transaction_hash,
            metadata_ref,
            audio_ref,
            image_ref,
        })
    }
}
