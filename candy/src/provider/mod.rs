//! Wallet provider boundary.
//!
//! The dashboard never signs or holds keys. Everything that needs custody or
//! chain access goes through a [`WalletProvider`], which is injected once at
//! startup and held for the lifetime of the session.

pub mod rpc;
pub mod watcher;

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::ChainDescriptor;
use crate::error::Result;

pub use rpc::JsonRpcWallet;

/// Notification pushed by the wallet when its connection changes under us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WalletEvent {
    /// Authorized accounts changed; an empty list means access was revoked.
    AccountsChanged { accounts: Vec<Address> },
    /// The wallet switched to another chain.
    ChainChanged { chain_id: u64 },
}

/// Settled transaction as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Capabilities consumed from the wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
    /// Whether a wallet is reachable at all.
    async fn is_available(&self) -> bool;

    /// Prompt the user to authorize accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts already authorized, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    /// Ask the wallet to switch chains.
    ///
    /// Fails with [`crate::CandyError::UnrecognizedChain`] when the wallet
    /// does not know the chain; any other failure means it was declined or
    /// broke.
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// Ask the wallet to add a chain definition.
    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<()>;

    /// Subscribe to account/chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Sign and submit a contract call from `from`.
    async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<TxHash>;

    /// Wait until `hash` is included. No timeout.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt>;
}
