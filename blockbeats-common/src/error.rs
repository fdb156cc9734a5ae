//! Common error types for BlockBeats

use thiserror::Error;

/// Common result type for BlockBeats operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across BlockBeats crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON-RPC transport or node error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Malformed ABI payload or log entry
    #[error("ABI error: {0}")]
    Abi(String),

    /// Upstream HTTP service failure (pinning API, gateway)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// On-chain transaction reverted or was never included
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
