use clap::{Parser, Subcommand};

/// candy-dash: CandyToken wallet dashboard.
#[derive(Parser, Debug)]
#[command(name = "candy-dash", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Wallet JSON-RPC endpoint [env: CANDY_RPC_URL]
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Token contract address [env: CANDY_CONTRACT_ADDRESS]
    #[arg(long, global = true)]
    pub contract: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive dashboard driven by console commands
    Dashboard(DashboardArgs),

    /// Probe the wallet once and print the session
    Status(StatusArgs),

    /// Mint tokens to the connected account
    Mint(MintArgs),

    /// Transfer tokens from the connected account
    Transfer(TransferArgs),

    /// Stream session snapshots as the wallet changes
    Watch(WatchArgs),
}

/// Arguments for the `dashboard` subcommand.
#[derive(Parser, Debug)]
pub struct DashboardArgs {
    /// Wallet poll interval (ms)
    #[arg(long, default_value = "2000")]
    pub poll_interval_ms: u64,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `mint` subcommand.
#[derive(Parser, Debug)]
pub struct MintArgs {
    /// Amount in whole tokens (e.g. 10, 0.5)
    pub amount: String,
}

/// Arguments for the `transfer` subcommand.
#[derive(Parser, Debug)]
pub struct TransferArgs {
    /// Recipient address (0x...)
    pub recipient: String,

    /// Amount in whole tokens (e.g. 10, 0.5)
    pub amount: String,
}

/// Arguments for the `watch` subcommand.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,

    /// Wallet poll interval (ms)
    #[arg(long, default_value = "2000")]
    pub poll_interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transfer() {
        let cli = Cli::parse_from([
            "candy-dash",
            "--rpc-url",
            "http://localhost:8545",
            "transfer",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "2.5",
        ]);
        assert_eq!(cli.rpc_url.as_deref(), Some("http://localhost:8545"));
        match cli.command {
            Command::Transfer(args) => {
                assert_eq!(args.recipient, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
                assert_eq!(args.amount, "2.5");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["candy-dash", "watch", "--json", "--log-level", "debug"]);
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Command::Watch(args) => {
                assert!(args.json);
                assert_eq!(args.poll_interval_ms, 2000);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
