//! Reply extraction from program log batches.
//!
//! The agent program's oracle callback writes two `msg!` lines:
//!
//! ```text
//! Program log: Agent Reply: "<reply text>"
//! Program log: Amount: <integer>
//! ```
//!
//! Everything that depends on that exact phrasing lives in this module.

use serde::{Deserialize, Serialize};

use crate::constants::{AMOUNT_TAG, PROGRAM_LOG_PREFIX, REPLY_TAG};

/// One log notification for the subscribed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Signature of the transaction that produced the logs.
    pub signature: String,
    pub lines: Vec<String>,
}

impl Notification {
    pub fn new(signature: impl Into<String>, lines: Vec<String>) -> Self {
        Self { signature: signature.into(), lines }
    }
}

/// Reply payload extracted from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub reply: String,
    /// Reward amount; 0 when the marker is absent or unparseable.
    pub amount: i128,
}

impl Reply {
    /// An empty reply never resolves a pending entry.
    pub fn is_resolvable(&self) -> bool {
        !self.reply.is_empty()
    }
}

/// Scan `lines` for the reply and amount markers.
///
/// Returns `None` when no line carries the reply marker. Later lines win
/// over earlier ones for both markers. A malformed amount becomes 0 and never
/// hides a reply.
pub fn parse_reply<S: AsRef<str>>(lines: &[S]) -> Option<Reply> {
    let mut reply: Option<String> = None;
    let mut amount: i128 = 0;

    for line in lines {
        let line = line.as_ref();
        if line.contains(REPLY_TAG) {
            reply = Some(extract_reply(line));
        } else if line.contains(AMOUNT_TAG) {
            amount = extract_amount(line);
        }
    }

    reply.map(|reply| Reply { reply, amount })
}

fn strip_markers(line: &str, tag: &str) -> String {
    line.replacen(tag, "", 1).replacen(PROGRAM_LOG_PREFIX, "", 1)
}

fn extract_reply(line: &str) -> String {
    let stripped = strip_markers(line, REPLY_TAG);
    let text = stripped.trim();
    // Leading and trailing quotes are removed independently.
    let text = text.strip_prefix('"').unwrap_or(text);
    let text = text.strip_suffix('"').unwrap_or(text);
    text.trim().to_owned()
}

fn extract_amount(line: &str) -> i128 {
    let stripped = strip_markers(line, AMOUNT_TAG);
    match stripped.trim().parse::<i128>() {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(line, "unparseable amount ({e}), defaulting to 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reply_and_amount() {
        let lines = ["Program log: Agent Reply: \"hello\"", "Program log: Amount: 42"];
        assert_eq!(
            parse_reply(&lines),
            Some(Reply { reply: "hello".into(), amount: 42 })
        );
    }

    #[test]
    fn malformed_amount_defaults_to_zero() {
        let lines = ["Program log: Agent Reply: \"nope\"", "Program log: Amount: notanumber"];
        assert_eq!(
            parse_reply(&lines),
            Some(Reply { reply: "nope".into(), amount: 0 })
        );
    }

    #[test]
    fn overflowing_amount_defaults_to_zero() {
        let lines = [
            "Program log: Agent Reply: \"big\"",
            "Program log: Amount: 999999999999999999999999999999999999999999",
        ];
        assert_eq!(parse_reply(&lines).unwrap().amount, 0);
    }

    #[test]
    fn empty_amount_defaults_to_zero() {
        let lines = ["Program log: Agent Reply: hi", "Program log: Amount:"];
        assert_eq!(parse_reply(&lines).unwrap().amount, 0);
    }

    #[test]
    fn missing_reply_is_none_whatever_the_amount() {
        assert_eq!(parse_reply(&["Program log: Amount: 42"]), None);
        assert_eq!(parse_reply(&["Program log: Amount: junk"]), None);
        assert_eq!(parse_reply::<&str>(&[]), None);
    }

    #[test]
    fn missing_amount_is_zero() {
        let lines = ["Program log: Agent Reply: \"only text\""];
        assert_eq!(
            parse_reply(&lines),
            Some(Reply { reply: "only text".into(), amount: 0 })
        );
    }

    #[test]
    fn last_occurrence_wins() {
        let lines = [
            "Program log: Agent Reply: \"first\"",
            "Program log: Amount: 1",
            "Program log: Agent Reply: \"second\"",
            "Program log: Amount: 2",
        ];
        assert_eq!(
            parse_reply(&lines),
            Some(Reply { reply: "second".into(), amount: 2 })
        );
    }

    #[test]
    fn quotes_are_stripped_independently() {
        let only_leading = ["Program log: Agent Reply: \"open"];
        assert_eq!(parse_reply(&only_leading).unwrap().reply, "open");

        let only_trailing = ["Program log: Agent Reply: close\""];
        assert_eq!(parse_reply(&only_trailing).unwrap().reply, "close");

        let doubled = ["Program log: Agent Reply: \"\"twice\"\""];
        assert_eq!(parse_reply(&doubled).unwrap().reply, "\"twice\"");
    }

    #[test]
    fn empty_reply_is_present_but_not_resolvable() {
        let lines = ["Program log: Agent Reply: \"\"", "Program log: Amount: 5"];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.reply, "");
        assert!(!reply.is_resolvable());
    }

    #[test]
    fn noise_lines_are_ignored() {
        let lines = [
            "Program LLMrieZMpbJFwN52WgmBNMxYojrpRVYXdC1RCweEbab invoke [1]",
            "Program log: Instruction: CallbackFromLlm",
            "Program log: Agent Reply: \"gm\"",
            "Program log: Amount: 7",
            "Program LLMrieZMpbJFwN52WgmBNMxYojrpRVYXdC1RCweEbab success",
        ];
        assert_eq!(
            parse_reply(&lines),
            Some(Reply { reply: "gm".into(), amount: 7 })
        );
    }

    #[test]
    fn reply_without_log_prefix_still_parses() {
        let lines = ["Agent Reply: plain", "Amount: -3"];
        assert_eq!(
            parse_reply(&lines),
            Some(Reply { reply: "plain".into(), amount: -3 })
        );
    }
}
