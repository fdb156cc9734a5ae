//! License event aggregation
//!
//! Rebuilds the set of licenses visible to one account from three sources:
//! the on-chain issuance log (immutable), a live active-status read (current
//! state), and the off-chain metadata document (best-effort). The result is a
//! materialized view; nothing is persisted between loads.
//!
//! The scan window is bounded: licenses issued more than `lookback_blocks`
//! before the current head are invisible to this view.

use crate::metadata::MetadataSource;
use blockbeats_chain::{LicenseContract, LicenseIssuedEvent};
use blockbeats_common::{Address, LicenseRecord, Result, Role};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reconstructs per-viewer license sets from issuance events
pub struct LicenseAggregator {
    contract: Arc<LicenseContract>,
    metadata: Arc<dyn MetadataSource>,
    lookback_blocks: u64,
}

impl LicenseAggregator {
    pub fn new(
        contract: Arc<LicenseContract>,
        metadata: Arc<dyn MetadataSource>,
        lookback_blocks: u64,
    ) -> Self {
        Self { contract, metadata, lookback_blocks }
    }

    /// All licenses where `viewer` is creator or licensee, within the scan
    /// window, deduplicated by license id and fully hydrated.
    ///
    /// Per-item hydration failures degrade that item (empty metadata,
    /// inactive status) and never remove it or fail the batch. An empty
    /// result is success, not an error. Output order is dedup order:
    /// creator-filtered events first, then licensee-filtered.
    pub async fn licenses_for(&self, viewer: &Address) -> Result<Vec<LicenseRecord>> {
        let head = self.contract.provider().block_number().await?;
        let from_block = scan_start(head, self.lookback_blocks);

        let by_creator = self
            .contract
            .issuance_events_by_creator(viewer, from_block, None)
            .await?;
        let by_licensee = self
            .contract
            .issuance_events_by_licensee(viewer, from_block, None)
            .await?;

        // Creator-filtered entries win on duplicate ids (an account that
        // licenses to itself still yields a single record)
        let mut seen = HashSet::new();
        let unique: Vec<LicenseIssuedEvent> = by_creator
            .into_iter()
            .chain(by_licensee)
            .filter(|event| seen.insert(event.license_id))
            .collect();

        debug!(
            "Scanning blocks {}..head {} for {}: {} unique issuance events",
            from_block,
            head,
            viewer,
            unique.len()
        );

        let records = join_all(unique.into_iter().map(|event| self.hydrate(event, viewer))).await;
        Ok(records)
    }

    /// Hydrate one issuance event into a full record. Infallible: both
    /// enrichment reads degrade on failure instead of propagating.
    async fn hydrate(&self, event: LicenseIssuedEvent, viewer: &Address) -> LicenseRecord {
        let (active, metadata) = tokio::join!(
            self.contract.is_license_active(event.license_id),
            self.metadata.resolve(&event.content_ref),
        );

        let is_active = match active {
            Ok(active) => active,
            Err(e) => {
                // Rendering a live license as inactive is recoverable on the
                // next load; the reverse is not
                warn!("Active-status read failed for license {}: {}", event.license_id, e);
                false
            }
        };

        LicenseRecord {
            id: event.license_id,
            creator: event.creator,
            licensee: event.licensee,
            license_type: event.license_type,
            start_timestamp: event.start_timestamp,
            end_timestamp: event.end_timestamp,
            content_ref: event.content_ref,
            is_active,
            metadata,
            role: Role::derive(&event.creator, viewer),
        }
    }
}

/// First block of the scan window; clamps at genesis for young chains
fn scan_start(head: u64, lookback: u64) -> u64 {
    head.saturating_sub(lookback)
}
