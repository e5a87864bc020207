//! Millisecond durations with a stable serialized form.
//!
//! Execution timeouts travel through host configuration files, so
//! [`DurationMs`] serializes as a plain integer of milliseconds instead of
//! serde's `{"secs": N, "nanos": N}` representation of `std::time::Duration`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Duration in milliseconds that serializes as a bare `u64`.
///
/// # Examples
///
/// ```
/// use relaycap_protocol::DurationMs;
///
/// let timeout = DurationMs::from_mins(5);
/// assert_eq!(timeout.as_millis(), 300_000);
///
/// let json = serde_json::to_string(&timeout).unwrap();
/// assert_eq!(json, "300000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(u64);

impl DurationMs {
    /// Create from milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Create from seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Create from minutes.
    pub const fn from_mins(mins: u64) -> Self {
        Self(mins.saturating_mul(60_000))
    }

    /// Get the value in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Convert to `std::time::Duration`.
    pub fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        Duration::from_millis(d.0)
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
