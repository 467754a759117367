//! Line-oriented console: turns typed input into reconciler commands.

use candy::{Command, OperationRequest};

pub const HELP: &str = "\
commands:
  connect                        connect your wallet
  mint <amount>                  mint tokens to your account
  transfer <recipient> <amount>  send tokens
  refresh                        re-read token details
  status                         show the dashboard
  help                           show this help
  quit                           exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(Command),
    Status,
    Help,
    Quit,
    Empty,
}

/// Parse one console line.
///
/// Amounts and addresses are passed through untouched; the reconciler
/// validates them.
pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(ConsoleInput::Empty);
    };
    let args: Vec<&str> = parts.collect();

    match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("connect", []) => Ok(ConsoleInput::Command(Command::Connect)),
        ("refresh", []) => Ok(ConsoleInput::Command(Command::Refresh)),
        ("mint", [amount]) => Ok(ConsoleInput::Command(Command::Submit(
            OperationRequest::Mint {
                amount: amount.to_string(),
            },
        ))),
        ("mint", _) => Err("usage: mint <amount>".into()),
        ("transfer", [recipient, amount]) => Ok(ConsoleInput::Command(Command::Submit(
            OperationRequest::Transfer {
                recipient: recipient.to_string(),
                amount: amount.to_string(),
            },
        ))),
        ("transfer", _) => Err("usage: transfer <recipient> <amount>".into()),
        ("status", []) => Ok(ConsoleInput::Status),
        ("help" | "?", _) => Ok(ConsoleInput::Help),
        ("quit" | "exit", _) => Ok(ConsoleInput::Quit),
        (other, _) => Err(format!("unknown command: {other} (type `help`)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mint() {
        assert_eq!(
            parse_line("mint 1.5").unwrap(),
            ConsoleInput::Command(Command::Submit(OperationRequest::Mint {
                amount: "1.5".into()
            }))
        );
    }

    #[test]
    fn test_parse_transfer() {
        assert_eq!(
            parse_line("  TRANSFER 0x70997970C51812dc3A010C7d01b50e0d17dc79C8 3 ").unwrap(),
            ConsoleInput::Command(Command::Submit(OperationRequest::Transfer {
                recipient: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".into(),
                amount: "3".into(),
            }))
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_line("connect").unwrap(), ConsoleInput::Command(Command::Connect));
        assert_eq!(parse_line("refresh").unwrap(), ConsoleInput::Command(Command::Refresh));
        assert_eq!(parse_line("status").unwrap(), ConsoleInput::Status);
        assert_eq!(parse_line("quit").unwrap(), ConsoleInput::Quit);
        assert_eq!(parse_line("   ").unwrap(), ConsoleInput::Empty);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_line("mint").unwrap_err(), "usage: mint <amount>");
        assert!(parse_line("transfer 0xabc").is_err());
        assert!(parse_line("burn 5").unwrap_err().starts_with("unknown command: burn"));
    }

    #[test]
    fn test_invalid_amount_is_forwarded() {
        // Rejected later by the reconciler, not here.
        assert!(matches!(
            parse_line("mint -4").unwrap(),
            ConsoleInput::Command(Command::Submit(_))
        ));
    }
}
