//! Plain-text rendering of the conversation and session banners.

use gpt_oracle_client::SessionEvent;
use gpt_oracle_protocol::InteractionEntry;

const EXPLORER_TX_URL: &str = "https://explorer.solana.com/tx";

/// Explorer link for a transaction signature.
pub fn explorer_url(signature: &str, devnet: bool) -> String {
    if devnet {
        format!("{EXPLORER_TX_URL}/{signature}?cluster=devnet")
    } else {
        format!("{EXPLORER_TX_URL}/{signature}")
    }
}

/// One turn. `loading` marks the newest entry while a request is in flight.
pub fn render_entry(entry: &InteractionEntry, loading: bool, devnet: bool) -> String {
    let mut out = format!("you   > {}\n", entry.input);
    match (&entry.reply, loading) {
        (Some(reply), _) => out.push_str(&format!("agent > {reply}\n")),
        (None, true) => out.push_str("agent > ...\n"),
        (None, false) => out.push_str("agent > (no reply)\n"),
    }
    if let Some(ref sig) = entry.signature {
        out.push_str(&format!("        {}\n", explorer_url(sig, devnet)));
    }
    out
}

/// Oldest turn first, as a terminal scrolls.
pub fn render_history(entries: &[InteractionEntry], awaiting: bool, devnet: bool) -> String {
    entries
        .iter()
        .enumerate()
        .rev()
        .map(|(i, e)| render_entry(e, i == 0 && awaiting, devnet))
        .collect()
}

/// Banner line for a session event, if it warrants one.
pub fn banner(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Confirmed { .. } => Some("[ok] Transaction confirmed".to_owned()),
        SessionEvent::Success { amount } => Some(format!("[ok] Received some tokens: {amount}")),
        SessionEvent::Error { message } => Some(format!("[error] {message}")),
        SessionEvent::Replied { .. } | SessionEvent::StateChanged { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> InteractionEntry {
        InteractionEntry {
            input: "ping".into(),
            reply: Some("pong".into()),
            amount: Some(3),
            signature: Some("5igSig".into()),
        }
    }

    fn pending() -> InteractionEntry {
        InteractionEntry { input: "hello?".into(), reply: None, amount: None, signature: None }
    }

    #[test]
    fn explorer_url_adds_devnet_cluster() {
        assert_eq!(explorer_url("abc", false), "https://explorer.solana.com/tx/abc");
        assert_eq!(
            explorer_url("abc", true),
            "https://explorer.solana.com/tx/abc?cluster=devnet"
        );
    }

    #[test]
    fn resolved_entry_shows_reply_and_link() {
        let text = render_entry(&resolved(), false, true);
        assert!(text.contains("you   > ping"));
        assert!(text.contains("agent > pong"));
        assert!(text.contains("tx/5igSig?cluster=devnet"));
    }

    #[test]
    fn only_newest_pending_entry_shows_loading() {
        let text = render_history(&[pending(), resolved()], true, false);
        let ping = text.find("you   > ping").unwrap();
        let hello = text.find("you   > hello?").unwrap();
        assert!(ping < hello, "oldest first");
        assert!(text.contains("agent > ..."));
    }

    #[test]
    fn banners_follow_events() {
        assert_eq!(
            banner(&SessionEvent::Success { amount: 10 }).as_deref(),
            Some("[ok] Received some tokens: 10")
        );
        assert_eq!(
            banner(&SessionEvent::Confirmed { signature: "s".into() }).as_deref(),
            Some("[ok] Transaction confirmed")
        );
        assert!(banner(&SessionEvent::Replied {
            signature: "s".into(),
            reply: "r".into(),
            amount: 0,
        })
        .is_none());
    }
}
