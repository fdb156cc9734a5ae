//! Chain provider capability
//!
//! Every component that touches the chain receives a `ChainProvider`
//! explicitly. There is no ambient global provider; tests inject in-memory
//! implementations and services inject an `RpcProvider`.

use async_trait::async_trait;
use blockbeats_common::{Address, Result};

/// Log query filter for one contract over a bounded block range
#[derive(Debug, Clone)]
pub struct LogFilter {
    /// Emitting contract address
    pub address: Address,
    /// First block of the scan window (inclusive)
    pub from_block: u64,
    /// Last block of the scan window; `None` means the node's latest block
    pub to_block: Option<u64>,
    /// Positional topic filter; `None` entries match any value
    pub topics: Vec<Option<[u8; 32]>>,
}

impl LogFilter {
    /// True when `topics` matches the log's topic list positionally
    pub fn matches_topics(&self, topics: &[[u8; 32]]) -> bool {
        self.topics.iter().enumerate().all(|(i, wanted)| match wanted {
            Some(value) => topics.get(i) == Some(value),
            None => true,
        })
    }
}

/// One emitted event log
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub transaction_hash: String,
}

/// Receipt of an included transaction
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub transaction_hash: String,
    /// False when the transaction reverted
    pub status: bool,
    pub block_number: u64,
    pub logs: Vec<LogEntry>,
}

/// Injected chain access capability
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Current head block number
    async fn block_number(&self) -> Result<u64>;

    /// Event logs matching `filter` within its block range
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>>;

    /// Read call against latest state; returns the raw return data
    async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>>;

    /// Submit a state-changing call and await inclusion
    async fn send_transaction(
        &self,
        from: &Address,
        to: &Address,
        data: Vec<u8>,
    ) -> Result<TxReceipt>;
}
