//! # BlockBeats Common Library
//!
//! Shared code for the BlockBeats license services including:
//! - License domain types (records, metadata documents, roles)
//! - Account address type
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod license;

pub use error::{Error, Result};
pub use license::{Address, LicenseMetadata, LicenseRecord, LicenseType, Role};
