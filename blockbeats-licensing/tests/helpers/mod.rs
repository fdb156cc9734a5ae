//! Shared test doubles for the licensing integration tests
//!
//! `InMemoryChain` is a minimal MusicLicense contract behind the
//! `ChainProvider` trait: it decodes the same call data the real contract
//! receives, keeps license state in memory, and emits `LicenseIssued` logs
//! with the production topic/data layout. `RecordingPublisher` and
//! `MapMetadata` stand in for the pinning API and the gateway.

use async_trait::async_trait;
use blockbeats_chain::contract::{encode_issued_event_data, LICENSE_ISSUED_TOPIC};
use blockbeats_chain::{abi, ChainProvider, LogEntry, LogFilter, TxReceipt};
use blockbeats_common::{Address, Error, LicenseMetadata, Result};
use blockbeats_licensing::{ContentPublisher, MetadataSource};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Deterministic issuance clock: licenses start at this epoch plus their id
pub const CHAIN_EPOCH: u64 = 1_700_000_000;

pub fn addr(byte: u8) -> Address {
    Address([byte; 20])
}

struct StoredLicense {
    id: u64,
    creator: Address,
    licensee: Address,
    license_type: u8,
    start_timestamp: u64,
    end_timestamp: u64,
    content_ref: String,
    active: bool,
}

#[derive(Default)]
struct ChainState {
    head: u64,
    licenses: Vec<StoredLicense>,
    logs: Vec<LogEntry>,
    transactions: u64,
}

/// In-memory chain carrying one MusicLicense deployment
pub struct InMemoryChain {
    address: Address,
    state: Mutex<ChainState>,
    /// License ids whose active-status reads fail (error-isolation tests)
    pub fail_active_for: Mutex<HashSet<u64>>,
}

impl InMemoryChain {
    pub fn new(contract_address: Address) -> Self {
        Self {
            address: contract_address,
            state: Mutex::new(ChainState { head: 100, ..Default::default() }),
            fail_active_for: Mutex::new(HashSet::new()),
        }
    }

    /// Number of state-changing transactions ever submitted
    pub fn transaction_count(&self) -> u64 {
        self.state.lock().unwrap().transactions
    }

    /// Advance the head without any transaction (window tests)
    pub fn mine_blocks(&self, count: u64) {
        self.state.lock().unwrap().head += count;
    }

    fn selector_of(data: &[u8]) -> Result<[u8; 4]> {
        data.get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::Rpc("Call data has no selector".to_string()))
    }

    fn apply_issue(&self, from: &Address, args: &[u8], tx_hash: &str) -> Result<TxReceipt> {
        let licensee = abi::decode_address(abi::word_at(args, 0)?)?;
        let license_type = abi::decode_u64(abi::word_at(args, 1)?)? as u8;
        let duration_days = abi::decode_u64(abi::word_at(args, 2)?)?;
        let content_ref = abi::decode_string(args, 3)?;

        let mut state = self.state.lock().unwrap();
        state.head += 1;
        state.transactions += 1;

        let id = state.licenses.len() as u64 + 1;
        let start_timestamp = CHAIN_EPOCH + id;
        let end_timestamp = start_timestamp + duration_days * 86_400;

        let log = LogEntry {
            address: self.address,
            topics: vec![
                *LICENSE_ISSUED_TOPIC,
                abi::encode_u64(id),
                abi::address_topic(from),
                abi::address_topic(&licensee),
            ],
            data: encode_issued_event_data(
                blockbeats_common::LicenseType::from_u8(license_type)?,
                start_timestamp,
                end_timestamp,
                &content_ref,
            ),
            block_number: state.head,
            transaction_hash: tx_hash.to_string(),
        };

        state.licenses.push(StoredLicense {
            id,
            creator: *from,
            licensee,
            license_type,
            start_timestamp,
            end_timestamp,
            content_ref,
            active: true,
        });
        state.logs.push(log.clone());

        Ok(TxReceipt {
            transaction_hash: tx_hash.to_string(),
            status: true,
            block_number: state.head,
            logs: vec![log],
        })
    }

    fn apply_deactivate(&self, args: &[u8], tx_hash: &str) -> Result<TxReceipt> {
        let id = abi::decode_u64(abi::word_at(args, 0)?)?;

        let mut state = self.state.lock().unwrap();
        state.head += 1;
        state.transactions += 1;

        // One-way transition; deactivating twice leaves state false
        if let Some(license) = state.licenses.iter_mut().find(|l| l.id == id) {
            license.active = false;
        }

        Ok(TxReceipt {
            transaction_hash: tx_hash.to_string(),
            status: true,
            block_number: state.head,
            logs: vec![],
        })
    }
}

#[async_trait]
impl ChainProvider for InMemoryChain {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().head)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == filter.address)
            .filter(|log| log.block_number >= filter.from_block)
            .filter(|log| filter.to_block.map_or(true, |to| log.block_number <= to))
            .filter(|log| filter.matches_topics(&log.topics))
            .cloned()
            .collect())
    }

    async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>> {
        if *to != self.address {
            return Err(Error::Rpc(format!("No contract at {}", to)));
        }

        let selector = Self::selector_of(&data)?;
        let args = &data[4..];
        let state = self.state.lock().unwrap();

        if selector == abi::selector("isLicenseActive(uint256)") {
            let id = abi::decode_u64(abi::word_at(args, 0)?)?;
            if self.fail_active_for.lock().unwrap().contains(&id) {
                return Err(Error::Rpc(format!("Injected read failure for license {}", id)));
            }
            let license = state
                .licenses
                .iter()
                .find(|l| l.id == id)
                .ok_or_else(|| Error::Rpc(format!("Unknown license {}", id)))?;
            Ok(abi::encode_u8(license.active as u8).to_vec())
        } else if selector == abi::selector("getIpfsHash(uint256)") {
            let id = abi::decode_u64(abi::word_at(args, 0)?)?;
            let license = state
                .licenses
                .iter()
                .find(|l| l.id == id)
                .ok_or_else(|| Error::Rpc(format!("Unknown license {}", id)))?;
            let mut out = Vec::new();
            out.extend_from_slice(&abi::encode_u64(abi::WORD as u64));
            out.extend_from_slice(&abi::encode_string_tail(&license.content_ref));
            Ok(out)
        } else if selector == abi::selector("licenseCounter()") {
            Ok(abi::encode_u64(state.licenses.len() as u64).to_vec())
        } else {
            Err(Error::Rpc("Unsupported call selector".to_string()))
        }
    }

    async fn send_transaction(
        &self,
        from: &Address,
        to: &Address,
        data: Vec<u8>,
    ) -> Result<TxReceipt> {
        if *to != self.address {
            return Err(Error::Rpc(format!("No contract at {}", to)));
        }

        let selector = Self::selector_of(&data)?;
        let args = &data[4..];
        let tx_hash = format!("0xtx{:04}", self.state.lock().unwrap().transactions + 1);

        if selector == abi::selector("issueLicense(address,uint8,uint256,string)") {
            self.apply_issue(from, args, &tx_hash)
        } else if selector == abi::selector("deactivateLicense(uint256)") {
            self.apply_deactivate(args, &tx_hash)
        } else {
            Err(Error::Rpc("Unsupported transaction selector".to_string()))
        }
    }
}

/// One pinned payload as the publisher saw it
#[derive(Debug, Clone, PartialEq)]
pub enum PinnedItem {
    File { name: String, size: usize },
    Json { name: String, content: Value },
}

/// Publisher that mints predictable refs and records every pin in order
#[derive(Default)]
pub struct RecordingPublisher {
    pub pins: Mutex<Vec<PinnedItem>>,
    /// Fail all binary pins (issuance abort tests)
    pub fail_files: bool,
    /// Fail all JSON pins
    pub fail_json: bool,
}

impl RecordingPublisher {
    pub fn pinned(&self) -> Vec<PinnedItem> {
        self.pins.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentPublisher for RecordingPublisher {
    async fn pin_file(&self, bytes: Vec<u8>, name: &str) -> Result<String> {
        if self.fail_files {
            return Err(Error::Upstream("Pinning service unavailable".to_string()));
        }
        let mut pins = self.pins.lock().unwrap();
        pins.push(PinnedItem::File { name: name.to_string(), size: bytes.len() });
        Ok(format!("QmFile{}", pins.len()))
    }

    async fn pin_json(&self, content: &Value, name: &str) -> Result<String> {
        if self.fail_json {
            return Err(Error::Upstream("Pinning service unavailable".to_string()));
        }
        let mut pins = self.pins.lock().unwrap();
        pins.push(PinnedItem::Json { name: name.to_string(), content: content.clone() });
        Ok(format!("QmJson{}", pins.len()))
    }
}

/// Metadata source backed by a map; unknown refs resolve to the empty
/// document, exactly like a failed gateway fetch
#[derive(Default)]
pub struct MapMetadata {
    documents: HashMap<String, LicenseMetadata>,
}

impl MapMetadata {
    pub fn with(mut self, content_ref: &str, document: LicenseMetadata) -> Self {
        self.documents.insert(content_ref.to_string(), document);
        self
    }
}

#[async_trait]
impl MetadataSource for MapMetadata {
    async fn resolve(&self, content_ref: &str) -> LicenseMetadata {
        self.documents.get(content_ref).cloned().unwrap_or_default()
    }
}
