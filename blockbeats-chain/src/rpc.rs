//! JSON-RPC 2.0 chain provider
//!
//! Thin HTTP client over a node's `eth_*` namespace. Submitted transactions
//! are considered complete once a receipt appears; the receipt poll is
//! bounded so an abandoned transaction surfaces as an error instead of
//! hanging the caller.

use crate::provider::{ChainProvider, LogEntry, LogFilter, TxReceipt};
use async_trait::async_trait;
use blockbeats_common::{Address, Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const RECEIPT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
const RECEIPT_POLL_ATTEMPTS: u32 = 120;

/// HTTP JSON-RPC implementation of `ChainProvider`
pub struct RpcProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
    #[serde(rename = "transactionHash")]
    transaction_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReceipt {
    #[serde(rename = "transactionHash")]
    transaction_hash: String,
    status: Option<String>,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
    logs: Vec<RawLog>,
}

impl RpcProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client (system error)"),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("RPC request: {} (id {})", method, id);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(Error::Rpc(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to parse {} response: {}", method, e)))?;

        if let Some(err) = parsed.error {
            return Err(Error::Rpc(format!(
                "{} node error {}: {}",
                method, err.code, err.message
            )));
        }

        parsed
            .result
            .ok_or_else(|| Error::Rpc(format!("{} returned no result", method)))
    }

    fn log_filter_params(filter: &LogFilter) -> Value {
        let topics: Vec<Value> = filter
            .topics
            .iter()
            .map(|topic| match topic {
                Some(t) => Value::String(encode_hex(t)),
                None => Value::Null,
            })
            .collect();

        json!([{
            "address": filter.address.to_hex(),
            "fromBlock": encode_quantity(filter.from_block),
            "toBlock": match filter.to_block {
                Some(block) => encode_quantity(block),
                None => "latest".to_string(),
            },
            "topics": topics,
        }])
    }

    fn decode_log(raw: RawLog) -> Result<LogEntry> {
        let topics = raw
            .topics
            .iter()
            .map(|t| {
                let bytes = decode_hex(t)?;
                bytes
                    .try_into()
                    .map_err(|_| Error::Rpc(format!("Log topic is not 32 bytes: {}", t)))
            })
            .collect::<Result<Vec<[u8; 32]>>>()?;

        Ok(LogEntry {
            address: raw.address.parse()?,
            topics,
            data: decode_hex(&raw.data)?,
            block_number: raw
                .block_number
                .as_deref()
                .map(decode_quantity)
                .transpose()?
                .unwrap_or(0),
            transaction_hash: raw.transaction_hash.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ChainProvider for RpcProvider {
    async fn block_number(&self) -> Result<u64> {
        let head: String = self.request("eth_blockNumber", json!([])).await?;
        decode_quantity(&head)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let raw: Vec<RawLog> = self
            .request("eth_getLogs", Self::log_filter_params(filter))
            .await?;
        raw.into_iter().map(Self::decode_log).collect()
    }

    async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let result: String = self
            .request(
                "eth_call",
                json!([{ "to": to.to_hex(), "data": encode_hex(&data) }, "latest"]),
            )
            .await?;
        decode_hex(&result)
    }

    async fn send_transaction(
        &self,
        from: &Address,
        to: &Address,
        data: Vec<u8>,
    ) -> Result<TxReceipt> {
        let tx_hash: String = self
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": from.to_hex(),
                    "to": to.to_hex(),
                    "data": encode_hex(&data),
                }]),
            )
            .await?;

        debug!("Transaction submitted: {}", tx_hash);

        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            let receipt: Option<RawReceipt> = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(raw) = receipt {
                let status = match raw.status.as_deref() {
                    Some(s) => decode_quantity(s)? != 0,
                    // Pre-Byzantium nodes omit status; assume success
                    None => true,
                };
                if !status {
                    return Err(Error::Transaction(format!("Transaction reverted: {}", tx_hash)));
                }
                return Ok(TxReceipt {
                    transaction_hash: raw.transaction_hash,
                    status,
                    block_number: raw
                        .block_number
                        .as_deref()
                        .map(decode_quantity)
                        .transpose()?
                        .unwrap_or(0),
                    logs: raw
                        .logs
                        .into_iter()
                        .map(Self::decode_log)
                        .collect::<Result<Vec<_>>>()?,
                });
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }

        Err(Error::Transaction(format!(
            "Transaction not included after {} seconds: {}",
            RECEIPT_POLL_ATTEMPTS, tx_hash
        )))
    }
}

/// `0x`-prefixed hex of arbitrary bytes
fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Bytes from `0x`-prefixed hex
fn decode_hex(data: &str) -> Result<Vec<u8>> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped).map_err(|e| Error::Rpc(format!("Invalid hex {}: {}", data, e)))
}

/// Minimal-form hex quantity per the RPC spec (no leading zeroes)
fn encode_quantity(value: u64) -> String {
    format!("{:#x}", value)
}

/// u64 from a hex quantity
fn decode_quantity(value: &str) -> Result<u64> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(stripped, 16)
        .map_err(|e| Error::Rpc(format!("Invalid quantity {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_use_minimal_hex_form() {
        assert_eq!(encode_quantity(0), "0x0");
        assert_eq!(encode_quantity(10_000), "0x2710");
        assert_eq!(decode_quantity("0x2710").unwrap(), 10_000);
        assert_eq!(decode_quantity("0x0").unwrap(), 0);
    }

    #[test]
    fn hex_round_trips() {
        let data = vec![0x00, 0xff, 0x12];
        assert_eq!(decode_hex(&encode_hex(&data)).unwrap(), data);
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn log_filter_serializes_null_topic_wildcards() {
        let filter = LogFilter {
            address: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            from_block: 90,
            to_block: None,
            topics: vec![Some([0xab; 32]), None, Some([0xcd; 32])],
        };

        let params = RpcProvider::log_filter_params(&filter);
        let obj = &params[0];
        assert_eq!(obj["fromBlock"], "0x5a");
        assert_eq!(obj["toBlock"], "latest");
        assert!(obj["topics"][1].is_null());
        assert_eq!(obj["topics"][0], format!("0x{}", "ab".repeat(32)));
    }
}
