//! License view model
//!
//! Filterable projection of an aggregated license set for presentation code.
//! Pure functions over the record slice; sorting is left to the caller, so
//! the aggregator's dedup order passes through unchanged.

use blockbeats_common::{LicenseRecord, Role};
use serde::{Deserialize, Serialize};

/// Presentation filter over an aggregated license set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseFilter {
    All,
    /// Licenses the viewer issued
    Creator,
    /// Licenses issued to the viewer
    Licensee,
    Active,
    Inactive,
}

impl LicenseFilter {
    pub fn matches(&self, record: &LicenseRecord) -> bool {
        match self {
            LicenseFilter::All => true,
            LicenseFilter::Creator => record.role == Role::Creator,
            LicenseFilter::Licensee => record.role == Role::Licensee,
            LicenseFilter::Active => record.is_active,
            LicenseFilter::Inactive => !record.is_active,
        }
    }
}

/// Records matching `filter`, in their original order
pub fn filter_licenses(records: &[LicenseRecord], filter: LicenseFilter) -> Vec<&LicenseRecord> {
    records.iter().filter(|record| filter.matches(record)).collect()
}

/// Per-filter totals for UI badges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub creator: usize,
    pub licensee: usize,
    pub active: usize,
    pub inactive: usize,
}

impl FilterCounts {
    pub fn tally(records: &[LicenseRecord]) -> Self {
        let mut counts = FilterCounts::default();
        for record in records {
            counts.all += 1;
            match record.role {
                Role::Creator => counts.creator += 1,
                Role::Licensee => counts.licensee += 1,
            }
            if record.is_active {
                counts.active += 1;
            } else {
                counts.inactive += 1;
            }
        }
        counts
    }
}
