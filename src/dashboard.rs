//! Long-running modes: the interactive dashboard and the snapshot stream.
//!
//! Both spawn the wallet watcher and the reconciler control loop, then
//! render every new snapshot until cancelled.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use candy::{JsonRpcWallet, SessionReconciler, WalletProvider};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::DashConfig;
use crate::console::{parse_line, ConsoleInput, HELP};
use crate::error::DashError;
use crate::output::{render, write_snapshot};

/// Run the interactive dashboard on stdin/stdout.
pub async fn run_dashboard(
    config: DashConfig,
    wallet: Arc<JsonRpcWallet>,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> Result<(), DashError> {
    let reconciler = SessionReconciler::new(Arc::clone(&wallet), config.candy.clone());
    let mut snapshots = reconciler.subscribe();
    let events = wallet.subscribe();
    let watcher = wallet.start_watching(poll_interval, cancel.clone());

    let (commands_tx, commands_rx) = mpsc::channel(16);
    let session = tokio::spawn(reconciler.run(commands_rx, events, cancel.clone()));

    let chain_name = config.candy.chain.chain_name.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_rendered = String::new();
    let mut result = Ok(());

    print_block(HELP)?;

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(ConsoleInput::Command(command)) => {
                        debug!(?command, "console command");
                        if commands_tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Ok(ConsoleInput::Status) => {
                        let text = render(&snapshots.borrow(), &chain_name);
                        print_block(&text)?;
                    }
                    Ok(ConsoleInput::Help) => print_block(HELP)?,
                    Ok(ConsoleInput::Quit) => break,
                    Ok(ConsoleInput::Empty) => {}
                    Err(message) => print_block(&message)?,
                },
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    result = Err(e.into());
                    break;
                }
            },

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = render(&snapshots.borrow_and_update(), &chain_name);
                if text != last_rendered {
                    print_block(&text)?;
                    last_rendered = text;
                }
            }

            _ = cancel.cancelled() => break,
        }
    }

    info!("dashboard closing");
    cancel.cancel();
    let _ = session.await;
    let _ = watcher.await;
    result
}

/// Stream one line per distinct snapshot until cancelled.
pub async fn run_watch(
    config: DashConfig,
    wallet: Arc<JsonRpcWallet>,
    json_mode: bool,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> Result<(), DashError> {
    let reconciler = SessionReconciler::new(Arc::clone(&wallet), config.candy);
    let mut snapshots = reconciler.subscribe();
    let events = wallet.subscribe();
    let watcher = wallet.start_watching(poll_interval, cancel.clone());

    // Read-only: the sender is held so the loop keeps its command branch.
    let (_commands_tx, commands_rx) = mpsc::channel(1);
    let session = tokio::spawn(reconciler.run(commands_rx, events, cancel.clone()));

    let mut buf = String::with_capacity(512);
    let stdout = std::io::stdout();
    let mut last = None;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if last.as_ref() == Some(&snapshot) {
                    continue;
                }
                let mut out = stdout.lock();
                write_snapshot(&snapshot, json_mode, &mut buf, &mut out)?;
                last = Some(snapshot);
            }
            _ = cancel.cancelled() => break,
        }
    }

    cancel.cancel();
    let _ = session.await;
    let _ = watcher.await;
    Ok(())
}

fn print_block(text: &str) -> Result<(), DashError> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", text.trim_end())?;
    out.flush()?;
    Ok(())
}
