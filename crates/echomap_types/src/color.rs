//! The Metro accent palette pings are drawn in.

use serde::{de, Deserialize, Serialize};

/// One of the seven Metro accent colors.
///
/// The palette is fixed; pings carry the color as its hex string on the wire
/// so that consumers can feed it straight into a style attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetroColor {
    /// `#00BCF2`
    Cyan,
    /// `#D13438`
    Magenta,
    /// `#A4C400`
    Lime,
    /// `#00B294`
    Teal,
    /// `#881798`
    Purple,
    /// `#FFB900`
    Gold,
    /// `#FF4343`
    Red,
}

impl MetroColor {
    /// Every palette entry, in display order.
    pub const ALL: [MetroColor; 7] = [
        MetroColor::Cyan,
        MetroColor::Magenta,
        MetroColor::Lime,
        MetroColor::Teal,
        MetroColor::Purple,
        MetroColor::Gold,
        MetroColor::Red,
    ];

    /// The color a session paints its own broadcasts in.
    pub fn user_default() -> Self {
        MetroColor::Cyan
    }

    /// The CSS hex string for this entry.
    pub fn hex(&self) -> &'static str {
        match self {
            MetroColor::Cyan => "#00BCF2",
            MetroColor::Magenta => "#D13438",
            MetroColor::Lime => "#A4C400",
            MetroColor::Teal => "#00B294",
            MetroColor::Purple => "#881798",
            MetroColor::Gold => "#FFB900",
            MetroColor::Red => "#FF4343",
        }
    }

    /// Look a palette entry up by its hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.hex() == hex)
    }
}

impl std::fmt::Display for MetroColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hex())
    }
}

impl Serialize for MetroColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.hex())
    }
}

impl<'de> Deserialize<'de> for MetroColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex)
            .ok_or_else(|| de::Error::custom(format!("not a Metro palette color: {hex}")))
    }
}
