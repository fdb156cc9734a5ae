//! # BlockBeats Chain Access
//!
//! Chain access layer for the MusicLicense contract:
//! - `ChainProvider` capability trait (injected, never ambient)
//! - JSON-RPC HTTP provider implementation
//! - Minimal ABI codec for the fixed contract interface
//! - Typed contract wrapper

pub mod abi;
pub mod contract;
pub mod provider;
pub mod rpc;

pub use contract::{IssuedLicense, LicenseContract, LicenseIssuedEvent, OnChainLicense};
pub use provider::{ChainProvider, LogEntry, LogFilter, TxReceipt};
pub use rpc::RpcProvider;
