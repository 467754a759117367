//! The single control loop driving a [`SessionReconciler`].

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provider::{WalletEvent, WalletProvider};

use super::{InFlight, OperationOutcome, OperationRequest, SessionReconciler};

/// User intent forwarded from a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Submit(OperationRequest),
    Refresh,
}

impl<P: WalletProvider> SessionReconciler<P> {
    /// Probe, then process commands, wallet events and the in-flight
    /// operation until `cancel` fires.
    ///
    /// Each event or command is handled to completion before the next one.
    /// A pending transaction does not block the loop.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: broadcast::Receiver<WalletEvent>,
        cancel: CancellationToken,
    ) {
        self.probe().await;

        let mut in_flight: Option<InFlight> = None;
        let mut commands_open = true;
        let mut events_open = true;

        loop {
            tokio::select! {
                outcome = next_outcome(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    // Failures are already on the banner.
                    let _ = self.settle(outcome).await;
                }

                event = events.recv(), if events_open => match event {
                    Ok(event) => self.handle_event(event).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "wallet events lagged, resyncing");
                        self.resync().await;
                    }
                    Err(RecvError::Closed) => {
                        warn!("wallet event stream closed");
                        events_open = false;
                    }
                },

                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        debug!(?command, "command");
                        if let Some(started) = self.dispatch(command).await {
                            in_flight = Some(started);
                        }
                    }
                    None => {
                        debug!("command channel closed");
                        commands_open = false;
                    }
                },

                _ = cancel.cancelled() => {
                    info!("session loop shutting down");
                    break;
                }
            }
        }

        if let Some(pending) = self.pending() {
            warn!(
                kind = pending.kind.verb(),
                amount = %pending.amount,
                "exiting with an operation still pending"
            );
        }
    }

    async fn dispatch(&mut self, command: Command) -> Option<InFlight> {
        match command {
            Command::Connect => {
                let _ = self.connect().await;
                None
            }
            Command::Refresh => {
                self.refresh().await;
                None
            }
            Command::Submit(request) => self.submit(request).ok(),
        }
    }
}

async fn next_outcome(in_flight: &mut Option<InFlight>) -> OperationOutcome {
    match in_flight {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}
