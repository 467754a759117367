//! EIP-1193 wallet spoken as JSON-RPC over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::config::ChainDescriptor;
use crate::error::{CandyError, Result};

use super::{TxReceipt, WalletEvent, WalletProvider};

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 / EIP-3326: the chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC 2.0: method not found.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

const DEFAULT_RECEIPT_POLL: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    to: Address,
    data: Bytes,
}

/// Wallet reachable over HTTP JSON-RPC (a wallet bridge or a dev node with
/// unlocked accounts).
#[derive(Debug)]
pub struct JsonRpcWallet {
    client: Client,
    url: Url,
    next_id: AtomicU64,
    events_tx: broadcast::Sender<WalletEvent>,
    receipt_poll_interval: Duration,
}

impl JsonRpcWallet {
    pub fn new(url: Url) -> Self {
        let (events_tx, _) = broadcast::channel(64);
        Self {
            client: Client::new(),
            url,
            next_id: AtomicU64::new(1),
            events_tx,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL,
        }
    }

    /// Override how often `wait_for_receipt` polls.
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Push a notification to every subscriber.
    pub(crate) fn publish(&self, event: WalletEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events_tx.send(event);
    }

    /// Issue one JSON-RPC request and decode its `result`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(method, id, "rpc request");
        let resp = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(CandyError::Http { status, message });
        }

        let decoded: RpcResponse = resp.json().await?;
        if let Some(err) = decoded.error {
            return Err(rpc_error(err.code, err.message));
        }

        Ok(serde_json::from_value(decoded.result.unwrap_or(Value::Null))?)
    }
}

fn rpc_error(code: i64, message: String) -> CandyError {
    match code {
        USER_REJECTED_CODE => CandyError::UserRejected(message),
        _ => CandyError::Rpc { code, message },
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| CandyError::Validation(format!("quantity is not 0x-prefixed: {raw}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| CandyError::Validation(format!("invalid hex quantity {raw}: {e}")))
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn is_available(&self) -> bool {
        match self.chain_id().await {
            Ok(_) => true,
            Err(e) => {
                debug!(url = %self.url, error = %e, "wallet endpoint unavailable");
                false
            }
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.request("eth_requestAccounts", json!([])).await {
            Err(CandyError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.accounts().await
            }
            other => other,
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let params = json!([{ "chainId": format!("{chain_id:#x}") }]);
        match self
            .request::<Value>("wallet_switchEthereumChain", params)
            .await
        {
            Ok(_) => Ok(()),
            Err(CandyError::Rpc { code, .. }) if code == UNRECOGNIZED_CHAIN_CODE => {
                Err(CandyError::UnrecognizedChain(chain_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<()> {
        let params = json!([chain.add_chain_params()]);
        self.request::<Value>("wallet_addEthereumChain", params)
            .await
            .map(|_| ())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events_tx.subscribe()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let call = CallRequest {
            from: None,
            to,
            data,
        };
        self.request("eth_call", json!([call, "latest"])).await
    }

    async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<TxHash> {
        let tx = CallRequest {
            from: Some(from),
            to,
            data,
        };
        self.request("eth_sendTransaction", json!([tx])).await
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        loop {
            let receipt: Option<RpcReceipt> = self
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;

            if let Some(receipt) = receipt {
                let block_number = match receipt.block_number.as_deref() {
                    Some(raw) => Some(parse_quantity(raw)?),
                    None => None,
                };
                let success = match receipt.status.as_deref() {
                    Some(raw) => parse_quantity(raw)? == 1,
                    None => {
                        // Pre-Byzantium receipts carry no status; inclusion is all we know.
                        warn!(tx = %hash, "receipt has no status field");
                        true
                    }
                };
                return Ok(TxReceipt {
                    transaction_hash: receipt.transaction_hash,
                    block_number,
                    success,
                });
            }

            debug!(tx = %hash, "transaction pending");
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x66eee").unwrap(), 421614);
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0X0").unwrap(), 0);
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert!(parse_quantity("421614").is_err());
        assert!(parse_quantity("0xzz").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_rpc_error_mapping() {
        assert!(matches!(
            rpc_error(4001, "User rejected the request.".into()),
            CandyError::UserRejected(_)
        ));
        assert!(matches!(
            rpc_error(-32000, "execution reverted".into()),
            CandyError::Rpc { code: -32000, .. }
        ));
    }

    #[test]
    fn test_call_request_shape() {
        let call = CallRequest {
            from: None,
            to: Address::ZERO,
            data: Bytes::from(vec![0x06, 0xfd, 0xde, 0x03]),
        };
        let value = serde_json::to_value(&call).unwrap();
        assert!(value.get("from").is_none());
        assert_eq!(value["data"], "0x06fdde03");
        assert_eq!(value["to"], "0x0000000000000000000000000000000000000000");
    }
}
