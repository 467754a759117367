//! Background poller that turns wallet state changes into [`WalletEvent`]s.
//!
//! HTTP JSON-RPC has no push channel for `accountsChanged` / `chainChanged`,
//! so a tokio task polls `eth_accounts` and `eth_chainId` and broadcasts a
//! notification whenever either differs from the last observed value.

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{JsonRpcWallet, WalletEvent, WalletProvider};

/// Last wallet state seen by the watcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observed {
    pub accounts: Option<Vec<Address>>,
    pub chain_id: Option<u64>,
}

impl Observed {
    /// Record a new observation and return the events it implies.
    ///
    /// The first observation of each field only sets the baseline.
    pub fn update(&mut self, accounts: Option<Vec<Address>>, chain_id: Option<u64>) -> Vec<WalletEvent> {
        let mut events = Vec::new();

        if let Some(accounts) = accounts {
            if let Some(previous) = &self.accounts {
                if *previous != accounts {
                    events.push(WalletEvent::AccountsChanged {
                        accounts: accounts.clone(),
                    });
                }
            }
            self.accounts = Some(accounts);
        }

        if let Some(chain_id) = chain_id {
            if let Some(previous) = self.chain_id {
                if previous != chain_id {
                    events.push(WalletEvent::ChainChanged { chain_id });
                }
            }
            self.chain_id = Some(chain_id);
        }

        events
    }
}

impl JsonRpcWallet {
    /// Spawn the polling task. It runs until `cancel` fires.
    pub fn start_watching(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let wallet = Arc::clone(self);

        tokio::spawn(async move {
            let mut observed = Observed::default();
            poll_once(&wallet, &mut observed).await;

            let mut ticker = time::interval(interval);
            ticker.tick().await; // consume immediate tick

            info!(interval_ms = interval.as_millis() as u64, "wallet watcher started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poll_once(&wallet, &mut observed).await;
                    }
                    _ = cancel.cancelled() => {
                        debug!("wallet watcher stopped");
                        return;
                    }
                }
            }
        })
    }
}

async fn poll_once(wallet: &JsonRpcWallet, observed: &mut Observed) {
    let accounts = match wallet.accounts().await {
        Ok(accounts) => Some(accounts),
        Err(e) => {
            warn!(error = %e, "eth_accounts poll failed");
            None
        }
    };
    let chain_id = match wallet.chain_id().await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "eth_chainId poll failed");
            None
        }
    };

    for event in observed.update(accounts, chain_id) {
        debug!(?event, "wallet state changed");
        wallet.publish(event);
    }
}
