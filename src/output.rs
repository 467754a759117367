use std::fmt::Write as _;
use std::io::Write;

use candy::{short_address, BannerLevel, Phase, SessionSnapshot};

use crate::error::DashError;

/// Write one snapshot line (TSV or JSON) to the writer.
pub fn write_snapshot<W: Write>(
    snapshot: &SessionSnapshot,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), DashError> {
    buf.clear();

    if json_mode {
        buf.push_str(&serde_json::to_string(snapshot)?);
    } else {
        // TSV: phase \t account \t chain_id \t symbol \t balance \t pending \t banner
        buf.push_str(snapshot.phase.as_str());
        buf.push('\t');
        push_opt(buf, snapshot.session.account.map(|a| a.to_string()));
        buf.push('\t');
        push_opt(buf, snapshot.session.chain_id.map(|id| id.to_string()));
        buf.push('\t');
        push_opt(buf, snapshot.token.as_ref().map(|t| t.symbol.clone()));
        buf.push('\t');
        push_opt(buf, snapshot.token.as_ref().map(|t| t.balance_display.clone()));
        buf.push('\t');
        push_opt(
            buf,
            snapshot
                .pending
                .as_ref()
                .map(|p| format!("{}:{}", p.kind.verb(), p.amount)),
        );
        buf.push('\t');
        push_opt(buf, snapshot.banner.as_ref().map(|b| b.message.clone()));
    }

    buf.push('\n');
    writer.write_all(buf.as_bytes())?;
    writer.flush()?;

    Ok(())
}

fn push_opt(buf: &mut String, value: Option<String>) {
    match value {
        Some(v) => buf.push_str(&v.replace('\t', " ")),
        None => buf.push('-'),
    }
}

/// Multi-line dashboard view.
pub fn render(snapshot: &SessionSnapshot, chain_name: &str) -> String {
    let mut out = String::new();

    if let Some(banner) = &snapshot.banner {
        let tag = match banner.level {
            BannerLevel::Success => "ok",
            BannerLevel::Error => "error",
            BannerLevel::Info => "info",
        };
        let _ = writeln!(out, "[{tag}] {}", banner.message);
    }
    if let Some(notice) = &snapshot.network_notice {
        let _ = writeln!(out, "[network] {notice}");
    }

    match snapshot.phase {
        Phase::Uninitialized | Phase::Probing => {
            let _ = writeln!(out, "Detecting wallet...");
            return out;
        }
        Phase::Disconnected => {
            let _ = writeln!(out, "Wallet:   not connected (type `connect`)");
            return out;
        }
        Phase::ConnectedWrongChain | Phase::ConnectedReady => {}
    }

    if let Some(account) = &snapshot.session.account {
        let _ = writeln!(out, "Account:  {}", short_address(account));
    }
    let chain = snapshot
        .session
        .chain_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".into());
    let _ = writeln!(
        out,
        "Network:  {chain} (required: {chain_name} {})",
        snapshot.required_chain_id
    );
    let _ = writeln!(out, "Contract: {}", short_address(&snapshot.contract_address));

    match &snapshot.token {
        Some(token) => {
            let _ = writeln!(out, "Token:    {} ({})", token.name, token.symbol);
            let _ = writeln!(out, "Balance:  {} {}", token.balance_display, token.symbol);
        }
        None if snapshot.phase == Phase::ConnectedReady => {
            let _ = writeln!(out, "Token:    unavailable (type `refresh`)");
        }
        None => {}
    }

    if let Some(pending) = &snapshot.pending {
        let target = pending
            .recipient
            .map(|r| format!(" to {}", short_address(&r)))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "Pending:  {} {}{target}...",
            pending.kind.verb(),
            pending.amount
        );
    }

    out
}
