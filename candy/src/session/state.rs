//! Value types owned by the session reconciler and handed out to views.

use std::fmt;

use alloy_primitives::{Address, U256};
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::error::{ErrorKind, Result};
use crate::provider::TxReceipt;
use crate::units::format_units;

/// Where the reconciler is in the wallet connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Probing,
    Disconnected,
    ConnectedWrongChain,
    ConnectedReady,
}

impl Phase {
    pub fn is_connected(self) -> bool {
        matches!(self, Phase::ConnectedWrongChain | Phase::ConnectedReady)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Probing => "probing",
            Phase::Disconnected => "disconnected",
            Phase::ConnectedWrongChain => "connected_wrong_chain",
            Phase::ConnectedReady => "connected_ready",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The wallet connection as last reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

/// Token details for the bound account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub name: String,
    pub symbol: String,
    /// Balance in base units.
    pub balance: U256,
    /// Balance in display units.
    pub balance_display: String,
}

impl TokenView {
    pub fn new(name: String, symbol: String, balance: U256, decimals: u32) -> Self {
        Self {
            name,
            symbol,
            balance,
            balance_display: format_units(balance, decimals),
        }
    }

    pub fn set_balance(&mut self, balance: U256, decimals: u32) {
        self.balance = balance;
        self.balance_display = format_units(balance, decimals);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Mint,
    Transfer,
}

impl OperationKind {
    pub fn verb(self) -> &'static str {
        match self {
            OperationKind::Mint => "mint",
            OperationKind::Transfer => "transfer",
        }
    }
}

/// A user intent as typed, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    Mint { amount: String },
    Transfer { recipient: String, amount: String },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Mint { .. } => OperationKind::Mint,
            OperationRequest::Transfer { .. } => OperationKind::Transfer,
        }
    }
}

/// A validated operation whose transaction has been handed to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    /// Amount in display units, as entered.
    pub amount: String,
    pub recipient: Option<Address>,
    /// Account the transaction was sent from.
    pub account: Address,
}

/// Result of a settled operation: the receipt once the transaction is included.
#[derive(Debug)]
pub struct OperationOutcome {
    pub operation: PendingOperation,
    pub result: Result<TxReceipt>,
}

/// Settlement future for an operation in flight.
pub type InFlight = BoxFuture<'static, OperationOutcome>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerLevel {
    Info,
    Success,
    Error,
}

/// Transient message shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub level: BannerLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Banner {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Info,
            kind: None,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Success,
            kind: None,
            message: message.into(),
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Error,
            kind: Some(kind),
            message: message.into(),
        }
    }
}

/// Read-only projection of the reconciler for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub session: Session,
    pub required_chain_id: u64,
    pub contract_address: Address,
    /// Signer the contract handle is bound to, if one exists.
    pub contract_signer: Option<Address>,
    pub token: Option<TokenView>,
    pub pending: Option<PendingOperation>,
    pub banner: Option<Banner>,
    /// Standing instruction while on the wrong chain.
    pub network_notice: Option<String>,
}

impl SessionSnapshot {
    pub fn initial(required_chain_id: u64, contract_address: Address) -> Self {
        Self {
            phase: Phase::Uninitialized,
            session: Session::default(),
            required_chain_id,
            contract_address,
            contract_signer: None,
            token: None,
            pending: None,
            banner: None,
            network_notice: None,
        }
    }

    pub fn has_contract(&self) -> bool {
        self.contract_signer.is_some()
    }

    /// Forms accept input only when ready and idle.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::ConnectedReady && self.pending.is_none()
    }
}
