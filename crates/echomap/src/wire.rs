//! The messages that travel the ping channel.

use echomap_types::Ping;
use serde::{Deserialize, Serialize};

/// One message on the wire, in the original `{ "type", "payload" }` shape.
///
/// `PING` carries a just-broadcast ping; `SYNC` replays a still-live ping to
/// an endpoint that connected after it was broadcast. Receivers treat both
/// the same way, a `SYNC` is just late.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "UPPERCASE")]
pub enum SignalMessage {
    /// A live broadcast.
    Ping(Ping),
    /// A replayed, still-live ping for a late subscriber.
    Sync(Ping),
}

impl SignalMessage {
    /// True for replayed messages.
    pub fn is_sync(&self) -> bool {
        matches!(self, SignalMessage::Sync(_))
    }

    /// Borrow the carried ping.
    pub fn payload(&self) -> &Ping {
        match self {
            SignalMessage::Ping(ping) | SignalMessage::Sync(ping) => ping,
        }
    }

    /// Take the carried ping.
    pub fn into_payload(self) -> Ping {
        match self {
            SignalMessage::Ping(ping) | SignalMessage::Sync(ping) => ping,
        }
    }
}

#[cfg(test)]
mod tests {
    use echomap_types::{Coordinate, MetroColor, Provenance, Timestamp};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> Ping {
        Ping {
            id: "wire-1".into(),
            coordinate: Coordinate::new(-33.9, 18.4),
            created_at: Timestamp::from_millis(1_700_000_000_000),
            color: MetroColor::Gold,
            provenance: Provenance::Ambient,
            label: Some("Anonymous User".into()),
        }
    }

    #[test]
    fn messages_use_the_type_payload_envelope() {
        let json = serde_json::to_value(SignalMessage::Ping(sample())).unwrap();
        assert_eq!(json["type"], "PING");
        assert_eq!(json["payload"]["id"], "wire-1");
        assert_eq!(json["payload"]["color"], "#FFB900");

        let json = serde_json::to_value(SignalMessage::Sync(sample())).unwrap();
        assert_eq!(json["type"], "SYNC");
    }

    #[test]
    fn messages_round_trip() {
        let msg = SignalMessage::Sync(sample());
        let json = serde_json::to_string(&msg).unwrap();
        let back: SignalMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
        assert!(back.is_sync());
        assert_eq!(back.payload().id.as_str(), "wire-1");
    }
}
