//! Static dashboard configuration: token contract and required chain.

use alloy_primitives::{address, Address};
use serde::Serialize;
use url::Url;

use crate::error::{CandyError, Result};

/// CandyToken deployment on Arbitrum Sepolia.
pub const CANDY_TOKEN_ADDRESS: Address = address!("0x49c31b473c3efbe8f5384eb7b77c257a961c8fc8");

/// Arbitrum Sepolia chain id.
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421_614;

/// Fixed decimal exponent of the token (display amount = base units / 10^18).
pub const TOKEN_DECIMALS: u32 = 18;

/// Native currency metadata as expected by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add (or switch to) the required chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

/// Wire shape of the single `wallet_addEthereumChain` parameter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams<'a> {
    pub chain_id: String,
    pub chain_name: &'a str,
    pub native_currency: &'a NativeCurrency,
    pub rpc_urls: &'a [String],
    pub block_explorer_urls: &'a [String],
}

impl ChainDescriptor {
    /// Chain id as a `0x`-prefixed hex quantity.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn add_chain_params(&self) -> AddChainParams<'_> {
        AddChainParams {
            chain_id: self.hex_chain_id(),
            chain_name: &self.chain_name,
            native_currency: &self.native_currency,
            rpc_urls: &self.rpc_urls,
            block_explorer_urls: &self.block_explorer_urls,
        }
    }
}

/// Configuration for the dashboard. Loaded once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct CandyConfig {
    /// Token contract address.
    pub contract_address: Address,
    /// Token decimal exponent.
    pub token_decimals: u32,
    /// Chain the contract is deployed on.
    pub chain: ChainDescriptor,
}

impl CandyConfig {
    /// Override the contract address from a hex string.
    pub fn with_contract_address(mut self, address: &str) -> Result<Self> {
        self.contract_address = address
            .trim()
            .parse()
            .map_err(|e| CandyError::Config(format!("invalid contract address {address}: {e}")))?;
        Ok(self)
    }

    /// RPC endpoint advertised for the required chain.
    pub fn default_rpc_url(&self) -> Result<Url> {
        let raw = self
            .chain
            .rpc_urls
            .first()
            .ok_or_else(|| CandyError::Config("chain has no RPC URL".into()))?;
        parse_rpc_url(raw)
    }
}

/// Validate an RPC endpoint URL (http or https only).
pub fn parse_rpc_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| CandyError::Config(format!("invalid RPC URL {raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CandyError::Config(format!(
            "unsupported RPC URL scheme {other}: {raw}"
        ))),
    }
}

/// Return the Arbitrum Sepolia configuration.
pub fn arbitrum_sepolia() -> CandyConfig {
    CandyConfig {
        contract_address: CANDY_TOKEN_ADDRESS,
        token_decimals: TOKEN_DECIMALS,
        chain: ChainDescriptor {
            chain_id: ARBITRUM_SEPOLIA_CHAIN_ID,
            chain_name: "Arbitrum Sepolia".into(),
            native_currency: NativeCurrency {
                name: "ETH".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://sepolia-rollup.arbitrum.io/rpc".into()],
            block_explorer_urls: vec!["https://sepolia.arbiscan.io/".into()],
        },
    }
}

impl Default for CandyConfig {
    fn default() -> Self {
        arbitrum_sepolia()
    }
}
