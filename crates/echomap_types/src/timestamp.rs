//! A millisecond-precision UTC timestamp for ping creation times.

mod error;

use std::{
    fmt,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

pub use error::{TimestampError, TimestampResult};

/// A millisecond-precision UTC timestamp.
///
/// Pings carry their creation time as wall-clock milliseconds since the UNIX
/// epoch, and every age/expiry computation in the system is done in
/// milliseconds. The raw value is an untrusted i64: pings received over a
/// transport may carry any offset another clock produced, so arithmetic here
/// is checked or saturating rather than panicking.
///
/// `Display` renders an RFC3339 time string when the value is representable
/// as one, and the raw millisecond tuple otherwise.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Timestamp(
    i64, // milliseconds from UNIX Epoch, positive or negative
);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.0) {
            Some(ts) => write!(
                f,
                "{}",
                ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            ),
            // Not a valid DateTime<Utc>; display the raw value
            None => write!(f, "({}ms)", self.0),
        }
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(t: chrono::DateTime<chrono::Utc>) -> Self {
        Timestamp(t.timestamp_millis())
    }
}

/// Timestamp + core::time::Duration: overflow-checked offset forward in time.
impl<D: Into<core::time::Duration>> Add<D> for Timestamp {
    type Output = TimestampResult<Timestamp>;

    fn add(self, rhs: D) -> Self::Output {
        self.checked_add(&rhs.into())
            .ok_or(TimestampError::Overflow)
    }
}

/// Timestamp - core::time::Duration: overflow-checked offset back in time.
impl<D: Into<core::time::Duration>> Sub<D> for Timestamp {
    type Output = TimestampResult<Timestamp>;

    fn sub(self, rhs: D) -> Self::Output {
        self.checked_sub(&rhs.into())
            .ok_or(TimestampError::Overflow)
    }
}

/// Signed distance between two Timestamps in milliseconds.
impl Sub<Timestamp> for Timestamp {
    type Output = TimestampResult<i64>;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        self.0.checked_sub(rhs.0).ok_or(TimestampError::Overflow)
    }
}

impl Timestamp {
    /// The smallest possible Timestamp.
    pub const MIN: Timestamp = Timestamp(i64::MIN);
    /// The largest possible Timestamp.
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    /// The current system time.
    pub fn now() -> Self {
        chrono::offset::Utc::now().into()
    }

    /// Construct from milliseconds since the UNIX epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Access time as milliseconds since the UNIX epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Add an unsigned duration, `None` on overflow or on durations beyond
    /// the i64 millisecond range.
    pub fn checked_add(&self, rhs: &core::time::Duration) -> Option<Timestamp> {
        let millis = rhs.as_millis();
        if millis <= i64::MAX as u128 {
            Some(Self(self.0.checked_add(millis as i64)?))
        } else {
            None
        }
    }

    /// Subtract an unsigned duration, `None` on overflow or on durations
    /// beyond the i64 millisecond range.
    pub fn checked_sub(&self, rhs: &core::time::Duration) -> Option<Timestamp> {
        let millis = rhs.as_millis();
        if millis <= i64::MAX as u128 {
            Some(Self(self.0.checked_sub(millis as i64)?))
        } else {
            None
        }
    }

    /// Add a duration, clamping to MAX on overflow.
    pub fn saturating_add(&self, rhs: &core::time::Duration) -> Timestamp {
        self.checked_add(rhs).unwrap_or(Self::MAX)
    }

    /// Subtract a duration, clamping to MIN on overflow.
    pub fn saturating_sub(&self, rhs: &core::time::Duration) -> Timestamp {
        self.checked_sub(rhs).unwrap_or(Self::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_checked_arithmetic() {
        let t = Timestamp::from_millis(8_000);
        assert_eq!(
            t.checked_add(&core::time::Duration::from_millis(1_000)),
            Some(Timestamp::from_millis(9_000))
        );
        assert_eq!(
            t.checked_sub(&core::time::Duration::from_millis(9_000)),
            Some(Timestamp::from_millis(-1_000))
        );
        assert_eq!(Timestamp::MAX.checked_add(&core::time::Duration::from_millis(1)), None);
        assert_eq!(
            (t + core::time::Duration::from_millis(500)),
            Ok(Timestamp::from_millis(8_500))
        );
        assert_eq!(
            Timestamp::MIN - core::time::Duration::from_millis(1),
            Err(TimestampError::Overflow)
        );
    }

    #[test]
    fn timestamp_saturates_at_bounds() {
        assert_eq!(
            Timestamp::MAX.saturating_add(&core::time::Duration::from_secs(1)),
            Timestamp::MAX
        );
        assert_eq!(
            Timestamp::MIN.saturating_sub(&core::time::Duration::from_secs(1)),
            Timestamp::MIN
        );
    }

    #[test]
    fn timestamp_signed_distance() {
        let a = Timestamp::from_millis(8_000);
        let b = Timestamp::from_millis(3_000);
        assert_eq!(a - b, Ok(5_000));
        assert_eq!(b - a, Ok(-5_000));
        assert_eq!(Timestamp::MIN - Timestamp::MAX, Err(TimestampError::Overflow));
    }

    #[test]
    fn timestamp_display_rfc3339() {
        let t = Timestamp::from_millis(1_588_706_164_266);
        assert_eq!(t.to_string(), "2020-05-05T19:16:04.266Z");
        // chrono cannot represent the extremes; fall back to the raw value
        assert_eq!(Timestamp::MAX.to_string(), format!("({}ms)", i64::MAX));
    }

    #[test]
    fn timestamp_serializes_as_millis() {
        let t = Timestamp::from_millis(2_500);
        assert_eq!(serde_json::to_string(&t).unwrap(), "2500");
        let back: Timestamp = serde_json::from_str("2500").unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn timestamp_now_is_recent() {
        // Anything after 2020 and before 3000AD will do
        let now = Timestamp::now();
        assert!(now > Timestamp::from_millis(1_577_836_800_000));
        assert!(now < Timestamp::from_millis(32_503_680_000_000));
    }
}
