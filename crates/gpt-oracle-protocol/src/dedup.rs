/// Single-slot replay guard over notification signatures.
///
/// Only the most recently accepted signature is remembered. The log stream
/// redelivers the same transaction (e.g. at several commitment levels), and
/// with a single interaction in flight the immediately previous signature is
/// the only one that can be replayed against the pending entry.
#[derive(Debug, Default)]
pub struct ReplyDeduplicator {
    last: Option<String>,
}

impl ReplyDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `signature` unless it equals the last
    /// accepted signature.
    pub fn accept(&mut self, signature: &str) -> bool {
        if self.last.as_deref() == Some(signature) {
            return false;
        }
        self.last = Some(signature.to_owned());
        true
    }

    pub fn last_accepted(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
