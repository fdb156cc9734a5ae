//! License domain types
//!
//! A license record is a materialized view: it is rebuilt on every load from
//! the on-chain issuance event, a live active-status read, and a best-effort
//! off-chain metadata document. Nothing here is persisted by BlockBeats.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte account address.
///
/// Parsed from hex with or without a `0x` prefix. Equality is byte equality,
/// so mixed-case renderings of the same account always compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex rendering
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| Error::InvalidInput(format!("Invalid address {}: {}", s, e)))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| Error::InvalidInput(format!("Invalid address length: {}", s)))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// License category, numeric on the wire (contract enum discriminant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseType {
    Streaming,
    Distribution,
    Commercial,
    Remix,
    Exclusive,
}

impl LicenseType {
    /// All categories in contract discriminant order
    pub const ALL: [LicenseType; 5] = [
        LicenseType::Streaming,
        LicenseType::Distribution,
        LicenseType::Commercial,
        LicenseType::Remix,
        LicenseType::Exclusive,
    ];

    pub fn from_u8(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("Unknown license type: {}", value)))
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            LicenseType::Streaming => "Streaming",
            LicenseType::Distribution => "Distribution",
            LicenseType::Commercial => "Commercial",
            LicenseType::Remix => "Remix",
            LicenseType::Exclusive => "Exclusive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LicenseType::Streaming => "License for streaming platforms",
            LicenseType::Distribution => "License for distribution to platforms",
            LicenseType::Commercial => "License for commercial use cases",
            LicenseType::Remix => "License to remix or sample the music",
            LicenseType::Exclusive => "Exclusive rights to the music",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Viewer's relationship to a license, derived per load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Creator,
    Licensee,
}

impl Role {
    /// Creator iff the viewing account matches the license creator.
    /// Address equality is byte equality, so hex casing never matters.
    pub fn derive(creator: &Address, viewer: &Address) -> Self {
        if creator == viewer {
            Role::Creator
        } else {
            Role::Licensee
        }
    }
}

/// Off-chain metadata document pinned alongside each license.
///
/// Every field is optional on read. A missing or malformed document resolves
/// to `LicenseMetadata::default()` rather than failing the license record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LicenseMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub audio_hash: Option<String>,
    pub image_hash: Option<String>,
    pub terms: Option<String>,
    pub created_at: Option<String>,
}

impl LicenseMetadata {
    /// True when no field carries a value (the degraded form)
    pub fn is_empty(&self) -> bool {
        *self == LicenseMetadata::default()
    }
}

/// Fully hydrated license record as seen by one viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: u64,
    pub creator: Address,
    pub licensee: Address,
    pub license_type: LicenseType,
    /// Validity window start, seconds since epoch
    pub start_timestamp: u64,
    /// Validity window end, seconds since epoch
    pub end_timestamp: u64,
    /// Content identifier of the off-chain metadata document
    pub content_ref: String,
    pub is_active: bool,
    pub metadata: LicenseMetadata,
    pub role: Role,
}
