//! # BlockBeats Licensing
//!
//! License lifecycle plumbing on top of the chain and pinning layers:
//! - `ContentPublisher` / pinning client (publish payloads, get content refs)
//! - `MetadataSource` / gateway resolver (best-effort document reads)
//! - Event aggregator (windowed scan, dedup, concurrent hydration)
//! - License view model (filterable projection)
//! - Issuance flow (publish → assemble → publish → transact pipeline)

pub mod aggregator;
pub mod issuance;
pub mod metadata;
pub mod pinning;
pub mod view;

pub use aggregator::LicenseAggregator;
pub use issuance::{FilePayload, IssuanceFlow, IssuanceOutcome, IssuanceRequest};
pub use metadata::{MetadataResolver, MetadataSource};
pub use pinning::{ContentPublisher, PinningClient};
pub use view::{filter_licenses, FilterCounts, LicenseFilter};
