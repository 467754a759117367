//! Typed bindings for the CandyToken contract.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::info;

use crate::error::{CandyError, Result};
use crate::provider::{TxReceipt, WalletProvider};

sol! {
    interface ICandyToken {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function balanceOf(address account) external view returns (uint256);
        function mint(uint256 value) external;
        function transfer(address to, uint256 value) external returns (bool);
    }
}

/// Contract handle bound to one signer account.
///
/// Cheap to clone: the provider is shared.
pub struct TokenContract<P> {
    address: Address,
    signer: Address,
    provider: Arc<P>,
}

impl<P> Clone for TokenContract<P> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            signer: self.signer,
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P> fmt::Debug for TokenContract<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenContract")
            .field("address", &self.address)
            .field("signer", &self.signer)
            .finish()
    }
}

impl<P: WalletProvider> TokenContract<P> {
    pub fn new(address: Address, signer: Address, provider: Arc<P>) -> Self {
        Self {
            address,
            signer,
            provider,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub async fn name(&self) -> Result<String> {
        self.read(ICandyToken::nameCall {}).await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.read(ICandyToken::symbolCall {}).await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        self.read(ICandyToken::balanceOfCall { account }).await
    }

    /// Mint `value` base units to the signer and wait for inclusion.
    pub async fn mint(&self, value: U256) -> Result<TxReceipt> {
        self.execute(ICandyToken::mintCall { value }).await
    }

    /// Transfer `value` base units from the signer to `to` and wait for inclusion.
    pub async fn transfer(&self, to: Address, value: U256) -> Result<TxReceipt> {
        self.execute(ICandyToken::transferCall { to, value }).await
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let data = self
            .provider
            .call(self.address, call.abi_encode().into())
            .await?;
        Ok(C::abi_decode_returns(&data)?)
    }

    async fn execute<C: SolCall>(&self, call: C) -> Result<TxReceipt> {
        let hash = self
            .provider
            .send_transaction(self.signer, self.address, call.abi_encode().into())
            .await?;
        info!(tx = %hash, method = C::SIGNATURE, "transaction submitted");

        let receipt = self.provider.wait_for_receipt(hash).await?;
        if !receipt.success {
            return Err(CandyError::Execution(format!(
                "transaction {hash} reverted"
            )));
        }

        info!(tx = %hash, block = ?receipt.block_number, "transaction included");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_selectors() {
        assert_eq!(ICandyToken::nameCall::SELECTOR, [0x06, 0xfd, 0xde, 0x03]);
        assert_eq!(ICandyToken::symbolCall::SELECTOR, [0x95, 0xd8, 0x9b, 0x41]);
        assert_eq!(ICandyToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(ICandyToken::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(ICandyToken::mintCall::SELECTOR, [0xa0, 0x71, 0x2d, 0x68]);
    }

    #[test]
    fn test_transfer_encoding() {
        let to = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let data = ICandyToken::transferCall {
            to,
            value: U256::from(5u64),
        }
        .abi_encode();
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[16..36], to.as_slice());
        assert_eq!(data[67], 5);
    }
}
