pub mod config;
pub mod contract;
pub mod error;
pub mod provider;
pub mod session;
pub mod units;

// ---- Top-level re-exports ----

pub use config::{arbitrum_sepolia, CandyConfig, ChainDescriptor, NativeCurrency};
pub use contract::TokenContract;
pub use error::{CandyError, ErrorKind, Result};

// Wallet boundary
pub use provider::{JsonRpcWallet, TxReceipt, WalletEvent, WalletProvider};

// Session
pub use session::{
    Banner, BannerLevel, Command, InFlight, OperationKind, OperationOutcome, OperationRequest,
    PendingOperation, Phase, Session, SessionReconciler, SessionSnapshot, TokenView,
};

// Units
pub use units::{format_units, parse_address, parse_amount, short_address};
