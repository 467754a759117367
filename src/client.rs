//! Wallet factory: resolves configuration and builds the JSON-RPC wallet.

use std::sync::Arc;

use candy::config::parse_rpc_url;
use candy::{arbitrum_sepolia, CandyConfig, JsonRpcWallet};
use tracing::info;
use url::Url;

use crate::error::DashError;

pub const RPC_URL_ENV: &str = "CANDY_RPC_URL";
pub const CONTRACT_ENV: &str = "CANDY_CONTRACT_ADDRESS";

/// Resolved startup settings.
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub candy: CandyConfig,
    pub rpc_url: Url,
}

/// Build the configuration from flags, then environment, then chain defaults.
pub fn load_config(
    rpc_flag: Option<&str>,
    contract_flag: Option<&str>,
) -> Result<DashConfig, DashError> {
    let rpc_env = std::env::var(RPC_URL_ENV).ok();
    let contract_env = std::env::var(CONTRACT_ENV).ok();
    resolve_config(
        rpc_flag.or(rpc_env.as_deref()),
        contract_flag.or(contract_env.as_deref()),
    )
}

fn resolve_config(rpc: Option<&str>, contract: Option<&str>) -> Result<DashConfig, DashError> {
    let mut candy = arbitrum_sepolia();
    if let Some(address) = contract {
        candy = candy.with_contract_address(address)?;
    }

    let rpc_url = match rpc {
        Some(raw) => parse_rpc_url(raw)?,
        None => candy.default_rpc_url()?,
    };

    Ok(DashConfig { candy, rpc_url })
}

/// Create the shared wallet handle.
pub fn create_wallet(config: &DashConfig) -> Arc<JsonRpcWallet> {
    info!(
        rpc = %config.rpc_url,
        contract = %config.candy.contract_address,
        chain = %config.candy.chain.chain_name,
        "wallet endpoint"
    );
    Arc::new(JsonRpcWallet::new(config.rpc_url.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candy::config::CANDY_TOKEN_ADDRESS;

    #[test]
    fn test_defaults_to_chain_rpc() {
        let config = resolve_config(None, None).unwrap();
        assert_eq!(
            config.rpc_url.as_str(),
            "https://sepolia-rollup.arbitrum.io/rpc"
        );
        assert_eq!(config.candy.contract_address, CANDY_TOKEN_ADDRESS);
    }

    #[test]
    fn test_overrides() {
        let config = resolve_config(
            Some("http://127.0.0.1:8545"),
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
        )
        .unwrap();
        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(
            config.candy.contract_address.to_string(),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(resolve_config(Some("ws://127.0.0.1:8546"), None).is_err());
        assert!(resolve_config(None, Some("not-an-address")).is_err());
    }
}
