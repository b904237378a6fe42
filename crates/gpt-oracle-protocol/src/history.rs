//! Newest-first, append-only conversation history.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// One request/reply turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub input: String,
    pub reply: Option<String>,
    /// Serialised as a string; amounts may exceed JSON's safe integer range.
    #[serde(with = "amount_as_string")]
    pub amount: Option<i128>,
    /// Signature of the notification that resolved this entry.
    pub signature: Option<String>,
}

impl InteractionEntry {
    fn pending(input: String) -> Self {
        Self { input, reply: None, amount: None, signature: None }
    }

    pub fn is_pending(&self) -> bool {
        self.reply.is_none()
    }
}

/// Ordered history, index 0 is the newest entry.
///
/// At most one entry is unresolved at any time, and when one is, it is the
/// newest. Entries are never removed or reordered.
#[derive(Debug, Default)]
pub struct InteractionQueue {
    entries: Vec<InteractionEntry>,
}

impl InteractionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a new unresolved entry.
    pub fn push_pending(&mut self, input: impl Into<String>) -> Result<(), ProtocolError> {
        if self.has_pending() {
            return Err(ProtocolError::ConcurrentPending);
        }
        self.entries.insert(0, InteractionEntry::pending(input.into()));
        Ok(())
    }

    /// Resolve the single unresolved entry.
    ///
    /// Returns the resolved entry, or `None` (leaving the history untouched)
    /// when nothing is pending.
    pub fn resolve_oldest_pending(
        &mut self,
        reply: impl Into<String>,
        amount: i128,
        signature: impl Into<String>,
    ) -> Option<&InteractionEntry> {
        let entry = self.entries.first_mut().filter(|e| e.is_pending())?;
        entry.reply = Some(reply.into());
        entry.amount = Some(amount);
        entry.signature = Some(signature.into());
        Some(&*entry)
    }

    pub fn has_pending(&self) -> bool {
        self.entries.first().is_some_and(InteractionEntry::is_pending)
    }

    pub fn pending(&self) -> Option<&InteractionEntry> {
        self.entries.first().filter(|e| e.is_pending())
    }

    pub fn entries(&self) -> &[InteractionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

mod amount_as_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<i128>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(n) => s.serialize_some(&n.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i128>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| s.parse().map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_pending_is_rejected() {
        let mut q = InteractionQueue::new();
        q.push_pending("x").unwrap();
        assert_eq!(q.push_pending("y"), Err(ProtocolError::ConcurrentPending));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn push_allowed_after_resolution() {
        let mut q = InteractionQueue::new();
        q.push_pending("x").unwrap();
        q.resolve_oldest_pending("rx", 0, "S1").unwrap();
        q.push_pending("y").unwrap();

        let inputs: Vec<_> = q.entries().iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, ["y", "x"]);
        assert!(q.entries()[0].is_pending());
        assert!(!q.entries()[1].is_pending());
    }

    #[test]
    fn resolve_sets_all_fields() {
        let mut q = InteractionQueue::new();
        q.push_pending("ping").unwrap();
        let entry = q.resolve_oldest_pending("pong", 42, "S1").unwrap().clone();
        assert_eq!(
            entry,
            InteractionEntry {
                input: "ping".into(),
                reply: Some("pong".into()),
                amount: Some(42),
                signature: Some("S1".into()),
            }
        );
        assert!(!q.has_pending());
    }

    #[test]
    fn resolve_without_pending_is_noop() {
        let mut q = InteractionQueue::new();
        assert!(q.resolve_oldest_pending("late", 1, "S0").is_none());

        q.push_pending("a").unwrap();
        q.resolve_oldest_pending("ra", 0, "S1").unwrap();
        assert!(q.resolve_oldest_pending("again", 9, "S2").is_none());

        let entry = &q.entries()[0];
        assert_eq!(entry.reply.as_deref(), Some("ra"));
        assert_eq!(entry.signature.as_deref(), Some("S1"));
    }

    #[test]
    fn entry_serialises_amount_as_string() {
        let mut q = InteractionQueue::new();
        q.push_pending("ping").unwrap();
        q.resolve_oldest_pending("pong", 42, "S1").unwrap();
        let json = serde_json::to_value(&q.entries()[0]).unwrap();
        assert_eq!(json["amount"], "42");

        let back: InteractionEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.amount, Some(42));
    }
}
