use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CandyError {
    #[error("no wallet provider detected")]
    ProviderMissing,

    #[error("user rejected the request: {0}")]
    UserRejected(String),

    #[error("wallet does not recognize chain {0}")]
    UnrecognizedChain(u64),

    #[error("Wrong network: connected to chain {current}, switch to chain {required} first")]
    WrongChain { current: u64, required: u64 },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("another operation is already in flight")]
    OperationInFlight,

    #[error("wallet is not ready: {0}")]
    NotReady(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ABI decode error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CandyError>;

/// Coarse error category used by views to pick a message and a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProviderMissing,
    UserRejected,
    WrongChain,
    Validation,
    Execution,
    Transport,
    Busy,
}

impl CandyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CandyError::ProviderMissing => ErrorKind::ProviderMissing,
            CandyError::UserRejected(_) => ErrorKind::UserRejected,
            CandyError::UnrecognizedChain(_) | CandyError::WrongChain { .. } => {
                ErrorKind::WrongChain
            }
            CandyError::Validation(_) | CandyError::Config(_) => ErrorKind::Validation,
            CandyError::Execution(_) => ErrorKind::Execution,
            CandyError::OperationInFlight | CandyError::NotReady(_) => ErrorKind::Busy,
            CandyError::Rpc { .. }
            | CandyError::Http { .. }
            | CandyError::Json(_)
            | CandyError::Request(_)
            | CandyError::Abi(_) => ErrorKind::Transport,
        }
    }

    /// Message suitable for a banner: the provider's own text where there is one.
    pub fn user_message(&self) -> String {
        match self {
            CandyError::UserRejected(msg) | CandyError::Execution(msg) => msg.clone(),
            CandyError::Rpc { message, .. } => message.clone(),
            CandyError::Validation(msg) | CandyError::NotReady(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CandyError::ProviderMissing.kind(), ErrorKind::ProviderMissing);
        assert_eq!(
            CandyError::UserRejected("denied".into()).kind(),
            ErrorKind::UserRejected
        );
        assert_eq!(CandyError::UnrecognizedChain(1).kind(), ErrorKind::WrongChain);
        assert_eq!(
            CandyError::Validation("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CandyError::Execution("reverted".into()).kind(),
            ErrorKind::Execution
        );
        assert_eq!(CandyError::OperationInFlight.kind(), ErrorKind::Busy);
        assert_eq!(
            CandyError::Rpc {
                code: -32000,
                message: "nonce too low".into()
            }
            .kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_user_message_prefers_provider_text() {
        let err = CandyError::Rpc {
            code: -32000,
            message: "insufficient funds for gas".into(),
        };
        assert_eq!(err.user_message(), "insufficient funds for gas");

        let err = CandyError::UserRejected("User denied transaction signature".into());
        assert_eq!(err.user_message(), "User denied transaction signature");
    }

    #[test]
    fn test_wrong_chain_display() {
        let err = CandyError::WrongChain {
            current: 1,
            required: 421614,
        };
        let msg = err.to_string();
        assert!(msg.contains("421614"), "{msg}");
        assert!(msg.contains("chain 1,"), "{msg}");
    }
}
