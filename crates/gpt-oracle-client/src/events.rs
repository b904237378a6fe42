use serde::Serialize;

use crate::session::SessionState;

/// Notifications for the presentation layer (banners, spinners).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to:   SessionState,
    },
    /// The request transaction reached `confirmed`.
    Confirmed {
        signature: String,
    },
    /// The pending entry was resolved by an oracle reply.
    Replied {
        signature: String,
        reply:     String,
        amount:    i128,
    },
    /// Only emitted for a resolved amount above zero.
    Success {
        amount: i128,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialise_with_type_tag() {
        let json = serde_json::to_value(SessionEvent::StateChanged {
            from: SessionState::Ready,
            to:   SessionState::SubmittingTx,
        })
        .unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["to"], "submitting_tx");

        let json = serde_json::to_value(SessionEvent::Success { amount: 42 }).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["amount"], 42);
    }
}
