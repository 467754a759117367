//! In-process wallet double for reconciler tests.
//!
//! Models an EIP-1193 wallet plus the CandyToken contract: balances live in a
//! map, mints optionally charge a fee, and receipts can be held back to keep
//! an operation in flight.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, TxHash, B256, U256};
use alloy_sol_types::{SolInterface, SolValue};
use async_trait::async_trait;
use candy::config::{ARBITRUM_SEPOLIA_CHAIN_ID, CANDY_TOKEN_ADDRESS};
use candy::contract::ICandyToken::ICandyTokenCalls;
use candy::{CandyError, ChainDescriptor, Result, TxReceipt, WalletEvent, WalletProvider};
use tokio::sync::{broadcast, Notify};

pub const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const CAROL: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

pub const MAINNET_CHAIN_ID: u64 = 1;

/// `n` whole tokens in base units.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// How the wallet answers `wallet_switchEthereumChain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchBehavior {
    Accept,
    Reject,
    Unrecognized,
}

#[derive(Debug)]
pub struct MockState {
    pub available: bool,
    /// Accounts already authorized (`eth_accounts`).
    pub accounts: Vec<Address>,
    /// Accounts granted when the user approves `eth_requestAccounts`.
    pub grantable: Vec<Address>,
    pub reject_connect: bool,
    pub chain_id: u64,
    pub switch: SwitchBehavior,
    pub add_fails: bool,
    pub fail_reads: bool,
    pub revert_transactions: bool,
    pub hold_receipts: bool,
    pub mint_fee: U256,
    pub balances: HashMap<Address, U256>,
    pub receipts: HashMap<TxHash, bool>,

    pub requests: usize,
    pub request_accounts_calls: usize,
    pub switch_calls: usize,
    pub add_calls: usize,
    pub read_calls: usize,
    pub send_calls: usize,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    events_tx: broadcast::Sender<WalletEvent>,
    release: Notify,
}

impl MockWallet {
    /// Alice connected on Arbitrum Sepolia holding 100 CANDY.
    pub fn ready() -> Self {
        let mut balances = HashMap::new();
        balances.insert(ALICE, tokens(100));
        balances.insert(BOB, tokens(7));
        Self::with_state(MockState {
            available: true,
            accounts: vec![ALICE],
            grantable: vec![ALICE],
            reject_connect: false,
            chain_id: ARBITRUM_SEPOLIA_CHAIN_ID,
            switch: SwitchBehavior::Accept,
            add_fails: false,
            fail_reads: false,
            revert_transactions: false,
            hold_receipts: false,
            mint_fee: U256::ZERO,
            balances,
            receipts: HashMap::new(),
            requests: 0,
            request_accounts_calls: 0,
            switch_calls: 0,
            add_calls: 0,
            read_calls: 0,
            send_calls: 0,
        })
    }

    pub fn with_state(state: MockState) -> Self {
        let (events_tx, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(state),
            events_tx,
            release: Notify::new(),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events_tx.subscribe()
    }

    pub fn emit(&self, event: WalletEvent) {
        self.events_tx.send(event).unwrap();
    }

    /// Let one held receipt through.
    pub fn release_receipt(&self) {
        self.release.notify_one();
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.state().balances.get(&account).copied().unwrap_or_default()
    }

    pub fn requests(&self) -> usize {
        self.state().requests
    }

    pub fn send_calls(&self) -> usize {
        self.state().send_calls
    }

    /// Poll until `check` passes, yielding to spawned tasks in between.
    pub async fn wait_until(&self, check: impl Fn(&MockState) -> bool) {
        for _ in 0..200 {
            if check(&self.state()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached: {:?}", self.state());
    }

    fn next_hash(state: &MockState) -> TxHash {
        B256::left_padding_from(&((state.receipts.len() as u64) + 1).to_be_bytes())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn is_available(&self) -> bool {
        self.state().available
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = self.state();
        state.requests += 1;
        state.request_accounts_calls += 1;
        if state.reject_connect {
            return Err(CandyError::UserRejected("User rejected the request.".into()));
        }
        state.accounts = state.grantable.clone();
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let mut state = self.state();
        state.requests += 1;
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        let mut state = self.state();
        state.requests += 1;
        Ok(state.chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let mut state = self.state();
        state.requests += 1;
        state.switch_calls += 1;
        match state.switch {
            SwitchBehavior::Accept => {
                state.chain_id = chain_id;
                Ok(())
            }
            SwitchBehavior::Reject => Err(CandyError::UserRejected(
                "User rejected the request.".into(),
            )),
            SwitchBehavior::Unrecognized => Err(CandyError::UnrecognizedChain(chain_id)),
        }
    }

    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<()> {
        let mut state = self.state();
        state.requests += 1;
        state.add_calls += 1;
        if state.add_fails {
            return Err(CandyError::UserRejected("User rejected the request.".into()));
        }
        // Wallets switch to a freshly added chain.
        state.chain_id = chain.chain_id;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events_tx.subscribe()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let mut state = self.state();
        state.requests += 1;
        state.read_calls += 1;
        if state.fail_reads || to != CANDY_TOKEN_ADDRESS {
            return Err(CandyError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            });
        }

        let encoded = match ICandyTokenCalls::abi_decode(&data)? {
            ICandyTokenCalls::name(_) => "CandyToken".to_string().abi_encode(),
            ICandyTokenCalls::symbol(_) => "CANDY".to_string().abi_encode(),
            ICandyTokenCalls::balanceOf(call) => state
                .balances
                .get(&call.account)
                .copied()
                .unwrap_or_default()
                .abi_encode(),
            _ => {
                return Err(CandyError::Rpc {
                    code: -32000,
                    message: "not a view function".into(),
                })
            }
        };
        Ok(encoded.into())
    }

    async fn send_transaction(&self, from: Address, to: Address, data: Bytes) -> Result<TxHash> {
        let mut state = self.state();
        state.requests += 1;
        state.send_calls += 1;
        assert_eq!(to, CANDY_TOKEN_ADDRESS);

        let hash = Self::next_hash(&state);
        if state.revert_transactions {
            state.receipts.insert(hash, false);
            return Ok(hash);
        }

        let success = match ICandyTokenCalls::abi_decode(&data)? {
            ICandyTokenCalls::mint(call) => {
                let credited = call.value.saturating_sub(state.mint_fee);
                *state.balances.entry(from).or_default() += credited;
                true
            }
            ICandyTokenCalls::transfer(call) => {
                let held = state.balances.get(&from).copied().unwrap_or_default();
                if held < call.value {
                    false
                } else {
                    state.balances.insert(from, held - call.value);
                    *state.balances.entry(call.to).or_default() += call.value;
                    true
                }
            }
            _ => false,
        };
        state.receipts.insert(hash, success);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        let hold = {
            let mut state = self.state();
            state.requests += 1;
            state.hold_receipts
        };
        if hold {
            self.release.notified().await;
        }

        let success = self
            .state()
            .receipts
            .get(&hash)
            .copied()
            .ok_or_else(|| CandyError::Execution(format!("unknown transaction {hash}")))?;
        Ok(TxReceipt {
            transaction_hash: hash,
            block_number: Some(1),
            success,
        })
    }
}
