mod actions;
mod cli;
mod client;
mod console;
mod dashboard;
mod error;
mod output;

use std::time::Duration;

use actions::Operation;
use clap::Parser;
use cli::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv(); // load .env if present

    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match client::load_config(cli.rpc_url.as_deref(), cli.contract.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    let wallet = client::create_wallet(&config);

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let result = match cli.command {
        Command::Dashboard(args) => {
            let interval = Duration::from_millis(args.poll_interval_ms);
            dashboard::run_dashboard(config, wallet, interval, cancel).await
        }
        Command::Watch(args) => {
            let interval = Duration::from_millis(args.poll_interval_ms);
            dashboard::run_watch(config, wallet, args.json, interval, cancel).await
        }
        Command::Status(args) => actions::run_status(config, wallet, args.json).await,
        Command::Mint(args) => {
            let operation = Operation::Mint {
                amount: args.amount,
            };
            actions::run_operation(config, wallet, operation, cancel).await
        }
        Command::Transfer(args) => {
            let operation = Operation::Transfer {
                recipient: args.recipient,
                amount: args.amount,
            };
            actions::run_operation(config, wallet, operation, cancel).await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "candy-dash failed");
        std::process::exit(1);
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
