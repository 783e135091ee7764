//! The ephemeral signal record everything else revolves around.

use serde::{Deserialize, Serialize};

use crate::{Coordinate, MetroColor, Timestamp};

/// Opaque unique identifier for a [`Ping`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PingId(String);

impl PingId {
    /// Generate a fresh random id.
    pub fn fresh() -> Self {
        Self(nanoid::nanoid!())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a ping came from, relative to the viewing session.
///
/// Purely cosmetic: eviction and capacity treat both kinds identically.
/// On the wire this is the `isUser` boolean of the original message shape,
/// which is why it is re-tagged [`Ambient`](Provenance::Ambient) when a ping
/// arrives from another session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Broadcast by this session's own user.
    Mine,
    /// Synthesized by the ambient feed or received from elsewhere.
    Ambient,
}

impl Serialize for Provenance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(matches!(self, Provenance::Mine))
    }
}

impl<'de> Deserialize<'de> for Provenance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(if bool::deserialize(deserializer)? {
            Provenance::Mine
        } else {
            Provenance::Ambient
        })
    }
}

/// A single ephemeral location signal.
///
/// A ping is immutable once constructed. It is created by exactly one of the
/// two producers (user broadcast, ambient feed), lives in the registry until
/// a sweep or a capacity truncation removes it, and is only ever handed out
/// as a clone.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Ping {
    /// Unique identifier, generated at creation.
    pub id: PingId,
    /// Where on the map the signal points.
    pub coordinate: Coordinate,
    /// Wall-clock creation time. Eviction is computed from this.
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
    /// Palette entry the signal is drawn in.
    pub color: MetroColor,
    /// Self/ambient tag, `isUser` on the wire.
    #[serde(rename = "isUser")]
    pub provenance: Provenance,
    /// Optional display label (`city` on the wire).
    #[serde(rename = "city", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Ping {
    /// Construct a ping with a fresh id, stamped with the current time.
    pub fn new(coordinate: Coordinate, color: MetroColor, provenance: Provenance) -> Self {
        Self {
            id: PingId::fresh(),
            coordinate,
            created_at: Timestamp::now(),
            color,
            provenance,
            label: None,
        }
    }

    /// Attach a display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// True if this session's own user broadcast the ping.
    pub fn is_mine(&self) -> bool {
        matches!(self.provenance, Provenance::Mine)
    }

    /// The instant this ping stops being live under the given TTL.
    pub fn expires_at(&self, ttl: core::time::Duration) -> Timestamp {
        self.created_at.saturating_add(&ttl)
    }

    /// True once the ping's age has reached the TTL.
    pub fn is_expired(&self, ttl: core::time::Duration, now: Timestamp) -> bool {
        self.expires_at(ttl) <= now
    }

    /// Re-tag a ping received from another session as ambient.
    ///
    /// Provenance is relative to the viewer, so a ping that was `isUser` for
    /// its sender is just ambient scenery here.
    pub fn into_remote(self) -> Self {
        Self {
            provenance: Provenance::Ambient,
            ..self
        }
    }
}
