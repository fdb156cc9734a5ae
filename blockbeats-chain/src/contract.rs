//! Typed wrapper for the deployed MusicLicense contract
//!
//! The interface is fixed and pre-deployed; this wrapper only encodes calls,
//! decodes returns and event logs, and routes them through an injected
//! `ChainProvider`. No contract logic lives on this side of the wire.

use crate::abi;
use crate::provider::{ChainProvider, LogEntry, LogFilter};
use blockbeats_common::{Address, Error, LicenseType, Result};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

static SEL_ISSUE_LICENSE: Lazy<[u8; 4]> =
    Lazy::new(|| abi::selector("issueLicense(address,uint8,uint256,string)"));
static SEL_DEACTIVATE_LICENSE: Lazy<[u8; 4]> =
    Lazy::new(|| abi::selector("deactivateLicense(uint256)"));
static SEL_IS_LICENSE_ACTIVE: Lazy<[u8; 4]> =
    Lazy::new(|| abi::selector("isLicenseActive(uint256)"));
static SEL_GET_IPFS_HASH: Lazy<[u8; 4]> = Lazy::new(|| abi::selector("getIpfsHash(uint256)"));
static SEL_LICENSES: Lazy<[u8; 4]> = Lazy::new(|| abi::selector("licenses(uint256)"));
static SEL_LICENSE_COUNTER: Lazy<[u8; 4]> = Lazy::new(|| abi::selector("licenseCounter()"));

/// Topic 0 of the issuance event
pub static LICENSE_ISSUED_TOPIC: Lazy<[u8; 32]> = Lazy::new(|| {
    abi::event_topic("LicenseIssued(uint256,address,address,uint8,uint256,uint256,string)")
});

/// Decoded `LicenseIssued` log entry
#[derive(Debug, Clone)]
pub struct LicenseIssuedEvent {
    pub license_id: u64,
    pub creator: Address,
    pub licensee: Address,
    pub license_type: LicenseType,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    /// Content identifier of the pinned metadata document
    pub content_ref: String,
    pub block_number: u64,
}

/// Stored license tuple as returned by `licenses(index)`
#[derive(Debug, Clone)]
pub struct OnChainLicense {
    pub creator: Address,
    pub licensee: Address,
    pub license_type: LicenseType,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    pub content_ref: String,
    pub is_active: bool,
}

/// Result of a successful issuance transaction
#[derive(Debug, Clone)]
pub struct IssuedLicense {
    pub license_id: u64,
    pub transaction_hash: String,
}

/// MusicLicense contract bound to one address and one provider
pub struct LicenseContract {
    provider: Arc<dyn ChainProvider>,
    address: Address,
}

impl LicenseContract {
    pub fn new(provider: Arc<dyn ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn provider(&self) -> &Arc<dyn ChainProvider> {
        &self.provider
    }

    /// Issue a new license and return the id assigned by the contract.
    ///
    /// The id is extracted from the `LicenseIssued` log of the receipt; a
    /// receipt without that event is an error.
    pub async fn issue_license(
        &self,
        from: &Address,
        licensee: &Address,
        license_type: LicenseType,
        duration_days: u64,
        content_ref: &str,
    ) -> Result<IssuedLicense> {
        let mut data = Vec::new();
        data.extend_from_slice(&*SEL_ISSUE_LICENSE);
        data.extend_from_slice(&abi::encode_address(licensee));
        data.extend_from_slice(&abi::encode_u8(license_type.as_u8()));
        data.extend_from_slice(&abi::encode_u64(duration_days));
        // Offset of the string tail, relative to the start of the arguments
        data.extend_from_slice(&abi::encode_u64(4 * abi::WORD as u64));
        data.extend_from_slice(&abi::encode_string_tail(content_ref));

        let receipt = self.provider.send_transaction(from, &self.address, data).await?;

        let event = receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .find(|log| log.topics.first() == Some(&*LICENSE_ISSUED_TOPIC))
            .map(Self::decode_issued_event)
            .transpose()?
            .ok_or_else(|| {
                Error::Transaction("License creation event not found in transaction".to_string())
            })?;

        debug!(
            "License {} issued to {} in tx {}",
            event.license_id, event.licensee, receipt.transaction_hash
        );

        Ok(IssuedLicense {
            license_id: event.license_id,
            transaction_hash: receipt.transaction_hash,
        })
    }

    /// Deactivate a license. One-way: an already inactive license stays
    /// inactive and the call simply leaves state unchanged.
    pub async fn deactivate_license(&self, from: &Address, license_id: u64) -> Result<()> {
        let mut data = Vec::new();
        data.extend_from_slice(&*SEL_DEACTIVATE_LICENSE);
        data.extend_from_slice(&abi::encode_u64(license_id));

        self.provider.send_transaction(from, &self.address, data).await?;
        Ok(())
    }

    /// Live active-status read against current contract state
    pub async fn is_license_active(&self, license_id: u64) -> Result<bool> {
        let data = Self::encode_u64_call(&SEL_IS_LICENSE_ACTIVE, license_id);
        let returned = self.provider.call(&self.address, data).await?;
        abi::decode_bool(abi::word_at(&returned, 0)?)
    }

    /// Content identifier stored for a license
    pub async fn get_ipfs_hash(&self, license_id: u64) -> Result<String> {
        let data = Self::encode_u64_call(&SEL_GET_IPFS_HASH, license_id);
        let returned = self.provider.call(&self.address, data).await?;
        abi::decode_string(&returned, 0)
    }

    /// Full stored tuple at `index`
    pub async fn license(&self, index: u64) -> Result<OnChainLicense> {
        let data = Self::encode_u64_call(&SEL_LICENSES, index);
        let returned = self.provider.call(&self.address, data).await?;

        Ok(OnChainLicense {
            creator: abi::decode_address(abi::word_at(&returned, 0)?)?,
            licensee: abi::decode_address(abi::word_at(&returned, 1)?)?,
            license_type: LicenseType::from_u8(
                abi::decode_u64(abi::word_at(&returned, 2)?)?
                    .try_into()
                    .map_err(|_| Error::Abi("License type out of range".to_string()))?,
            )?,
            start_timestamp: abi::decode_u64(abi::word_at(&returned, 3)?)?,
            end_timestamp: abi::decode_u64(abi::word_at(&returned, 4)?)?,
            content_ref: abi::decode_string(&returned, 5)?,
            is_active: abi::decode_bool(abi::word_at(&returned, 6)?)?,
        })
    }

    /// Total number of licenses ever issued
    pub async fn license_counter(&self) -> Result<u64> {
        let data = SEL_LICENSE_COUNTER.to_vec();
        let returned = self.provider.call(&self.address, data).await?;
        abi::decode_u64(abi::word_at(&returned, 0)?)
    }

    /// Issuance events where `creator` is the issuing account
    pub async fn issuance_events_by_creator(
        &self,
        creator: &Address,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<LicenseIssuedEvent>> {
        let filter = LogFilter {
            address: self.address,
            from_block,
            to_block,
            topics: vec![Some(*LICENSE_ISSUED_TOPIC), None, Some(abi::address_topic(creator))],
        };
        self.query_issuance_events(&filter).await
    }

    /// Issuance events where `licensee` is the receiving account
    pub async fn issuance_events_by_licensee(
        &self,
        licensee: &Address,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<LicenseIssuedEvent>> {
        let filter = LogFilter {
            address: self.address,
            from_block,
            to_block,
            topics: vec![
                Some(*LICENSE_ISSUED_TOPIC),
                None,
                None,
                Some(abi::address_topic(licensee)),
            ],
        };
        self.query_issuance_events(&filter).await
    }

    async fn query_issuance_events(&self, filter: &LogFilter) -> Result<Vec<LicenseIssuedEvent>> {
        let logs = self.provider.get_logs(filter).await?;
        logs.iter().map(Self::decode_issued_event).collect()
    }

    /// Decode one `LicenseIssued` log
    pub fn decode_issued_event(log: &LogEntry) -> Result<LicenseIssuedEvent> {
        if log.topics.first() != Some(&*LICENSE_ISSUED_TOPIC) {
            return Err(Error::Abi("Not a LicenseIssued log".to_string()));
        }
        if log.topics.len() != 4 {
            return Err(Error::Abi(format!(
                "LicenseIssued expects 4 topics, got {}",
                log.topics.len()
            )));
        }

        Ok(LicenseIssuedEvent {
            license_id: abi::decode_u64(&log.topics[1])?,
            creator: abi::decode_address(&log.topics[2])?,
            licensee: abi::decode_address(&log.topics[3])?,
            license_type: LicenseType::from_u8(
                abi::decode_u64(abi::word_at(&log.data, 0)?)?
                    .try_into()
                    .map_err(|_| Error::Abi("License type out of range".to_string()))?,
            )?,
            start_timestamp: abi::decode_u64(abi::word_at(&log.data, 1)?)?,
            end_timestamp: abi::decode_u64(abi::word_at(&log.data, 2)?)?,
            content_ref: abi::decode_string(&log.data, 3)?,
            block_number: log.block_number,
        })
    }

    fn encode_u64_call(selector: &[u8; 4], value: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + abi::WORD);
        data.extend_from_slice(selector);
        data.extend_from_slice(&abi::encode_u64(value));
        data
    }
}

/// Build the event-data payload for a `LicenseIssued` log.
///
/// Shared by tests and in-memory providers; the live chain produces this
/// layout itself.
pub fn encode_issued_event_data(
    license_type: LicenseType,
    start_timestamp: u64,
    end_timestamp: u64,
    content_ref: &str,
) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&abi::encode_u8(license_type.as_u8()));
    data.extend_from_slice(&abi::encode_u64(start_timestamp));
    data.extend_from_slice(&abi::encode_u64(end_timestamp));
    data.extend_from_slice(&abi::encode_u64(4 * abi::WORD as u64));
    data.extend_from_slice(&abi::encode_string_tail(content_ref));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TxReceipt;
    use async_trait::async_trait;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn issued_log(
        contract: &Address,
        license_id: u64,
        creator: &Address,
        licensee: &Address,
        content_ref: &str,
    ) -> LogEntry {
        LogEntry {
            address: *contract,
            topics: vec![
                *LICENSE_ISSUED_TOPIC,
                abi::encode_u64(license_id),
                abi::address_topic(creator),
                abi::address_topic(licensee),
            ],
            data: encode_issued_event_data(LicenseType::Streaming, 1_000, 2_000, content_ref),
            block_number: 42,
            transaction_hash: "0xabc".to_string(),
        }
    }

    /// Canned provider: returns a fixed receipt for transactions and routes
    /// read calls by selector.
    struct CannedProvider {
        receipt_logs: Vec<LogEntry>,
        active: bool,
    }

    #[async_trait]
    impl ChainProvider for CannedProvider {
        async fn block_number(&self) -> Result<u64> {
            Ok(100)
        }

        async fn get_logs(&self, _filter: &LogFilter) -> Result<Vec<LogEntry>> {
            Ok(self.receipt_logs.clone())
        }

        async fn call(&self, _to: &Address, data: Vec<u8>) -> Result<Vec<u8>> {
            if data[..4] == *SEL_IS_LICENSE_ACTIVE {
                Ok(abi::encode_u8(self.active as u8).to_vec())
            } else if data[..4] == *SEL_GET_IPFS_HASH {
                let mut out = Vec::new();
                out.extend_from_slice(&abi::encode_u64(32));
                out.extend_from_slice(&abi::encode_string_tail("QmStoredRef"));
                Ok(out)
            } else if data[..4] == *SEL_LICENSE_COUNTER {
                Ok(abi::encode_u64(7).to_vec())
            } else if data[..4] == *SEL_LICENSES {
                let mut out = Vec::new();
                out.extend_from_slice(&abi::encode_address(&addr(1)));
                out.extend_from_slice(&abi::encode_address(&addr(2)));
                out.extend_from_slice(&abi::encode_u8(LicenseType::Remix.as_u8()));
                out.extend_from_slice(&abi::encode_u64(1_000));
                out.extend_from_slice(&abi::encode_u64(2_000));
                out.extend_from_slice(&abi::encode_u64(7 * abi::WORD as u64));
                out.extend_from_slice(&abi::encode_u8(1));
                out.extend_from_slice(&abi::encode_string_tail("QmTupleRef"));
                Ok(out)
            } else {
                Err(Error::Rpc("Unexpected selector".to_string()))
            }
        }

        async fn send_transaction(
            &self,
            _from: &Address,
            _to: &Address,
            _data: Vec<u8>,
        ) -> Result<TxReceipt> {
            Ok(TxReceipt {
                transaction_hash: "0xdeadbeef".to_string(),
                status: true,
                block_number: 43,
                logs: self.receipt_logs.clone(),
            })
        }
    }

    fn contract_with(provider: CannedProvider) -> LicenseContract {
        LicenseContract::new(Arc::new(provider), addr(0xcc))
    }

    #[tokio::test]
    async fn issue_license_extracts_id_from_event() {
        let contract_addr = addr(0xcc);
        let log = issued_log(&contract_addr, 5, &addr(1), &addr(2), "QmMeta");
        let contract = contract_with(CannedProvider { receipt_logs: vec![log], active: true });

        let issued = contract
            .issue_license(&addr(1), &addr(2), LicenseType::Streaming, 30, "QmMeta")
            .await
            .unwrap();

        assert_eq!(issued.license_id, 5);
        assert_eq!(issued.transaction_hash, "0xdeadbeef");
    }

    #[tokio::test]
    async fn issue_license_without_event_is_an_error() {
        let contract = contract_with(CannedProvider { receipt_logs: vec![], active: true });

        let err = contract
            .issue_license(&addr(1), &addr(2), LicenseType::Streaming, 30, "QmMeta")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transaction(_)));
    }

    #[tokio::test]
    async fn issue_license_ignores_foreign_logs() {
        let contract_addr = addr(0xcc);
        let foreign = issued_log(&addr(0xdd), 9, &addr(1), &addr(2), "QmOther");
        let own = issued_log(&contract_addr, 5, &addr(1), &addr(2), "QmMeta");
        let contract =
            contract_with(CannedProvider { receipt_logs: vec![foreign, own], active: true });

        let issued = contract
            .issue_license(&addr(1), &addr(2), LicenseType::Streaming, 30, "QmMeta")
            .await
            .unwrap();

        assert_eq!(issued.license_id, 5);
    }

    #[tokio::test]
    async fn read_calls_decode_their_returns() {
        let contract = contract_with(CannedProvider { receipt_logs: vec![], active: true });

        assert!(contract.is_license_active(1).await.unwrap());
        assert_eq!(contract.get_ipfs_hash(1).await.unwrap(), "QmStoredRef");
        assert_eq!(contract.license_counter().await.unwrap(), 7);

        let stored = contract.license(0).await.unwrap();
        assert_eq!(stored.creator, addr(1));
        assert_eq!(stored.licensee, addr(2));
        assert_eq!(stored.license_type, LicenseType::Remix);
        assert_eq!(stored.content_ref, "QmTupleRef");
        assert!(stored.is_active);
    }

    #[test]
    fn issued_event_round_trips() {
        let contract_addr = addr(0xcc);
        let log = issued_log(&contract_addr, 12, &addr(7), &addr(8), "QmRoundTrip");

        let event = LicenseContract::decode_issued_event(&log).unwrap();
        assert_eq!(event.license_id, 12);
        assert_eq!(event.creator, addr(7));
        assert_eq!(event.licensee, addr(8));
        assert_eq!(event.license_type, LicenseType::Streaming);
        assert_eq!(event.start_timestamp, 1_000);
        assert_eq!(event.end_timestamp, 2_000);
        assert_eq!(event.content_ref, "QmRoundTrip");
        assert_eq!(event.block_number, 42);
    }

    #[test]
    fn non_issuance_log_is_rejected() {
        let log = LogEntry {
            address: addr(0xcc),
            topics: vec![[0u8; 32]],
            data: vec![],
            block_number: 1,
            transaction_hash: String::new(),
        };
        assert!(LicenseContract::decode_issued_event(&log).is_err());
    }
}
