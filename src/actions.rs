//! One-shot subcommands: probe once, optionally run one operation, print.

use std::io::Write;
use std::sync::Arc;

use candy::{JsonRpcWallet, Phase, SessionReconciler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::DashConfig;
use crate::error::DashError;
use crate::output::{render, write_snapshot};

/// Probe the wallet and print the resulting session.
pub async fn run_status(
    config: DashConfig,
    wallet: Arc<JsonRpcWallet>,
    json_mode: bool,
) -> Result<(), DashError> {
    let mut reconciler = SessionReconciler::new(wallet, config.candy.clone());
    reconciler.probe().await;

    let snapshot = reconciler.snapshot();
    let mut out = std::io::stdout().lock();
    if json_mode {
        let mut buf = String::new();
        write_snapshot(&snapshot, true, &mut buf, &mut out)?;
    } else {
        write!(out, "{}", render(&snapshot, &config.candy.chain.chain_name))?;
        out.flush()?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum Operation {
    Mint { amount: String },
    Transfer { recipient: String, amount: String },
}

/// Connect if needed, run one operation and wait for it to settle.
pub async fn run_operation(
    config: DashConfig,
    wallet: Arc<JsonRpcWallet>,
    operation: Operation,
    cancel: CancellationToken,
) -> Result<(), DashError> {
    let mut reconciler = SessionReconciler::new(wallet, config.candy.clone());
    reconciler.probe().await;

    if reconciler.phase() == Phase::Disconnected {
        reconciler.connect().await?;
    }
    if reconciler.phase() != Phase::ConnectedReady {
        let reason = reconciler
            .network_notice()
            .map(str::to_string)
            .or_else(|| reconciler.banner().map(|b| b.message.clone()))
            .unwrap_or_else(|| format!("phase is {}", reconciler.phase()));
        return Err(DashError::NotReady(reason));
    }

    let settled = tokio::select! {
        result = async {
            match &operation {
                Operation::Mint { amount } => reconciler.mint(amount).await,
                Operation::Transfer { recipient, amount } => {
                    reconciler.transfer(recipient, amount).await
                }
            }
        } => result,
        _ = cancel.cancelled() => {
            warn!("interrupted; the transaction may still be included");
            return Ok(());
        }
    };

    if let Some(banner) = reconciler.banner() {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", banner.message)?;
    }

    match settled {
        Ok(receipt) => {
            info!(tx = %receipt.transaction_hash, "operation complete");
            let mut out = std::io::stdout().lock();
            if let Some(token) = reconciler.token() {
                writeln!(out, "Balance: {} {}", token.balance_display, token.symbol)?;
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
