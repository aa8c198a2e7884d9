//! Time utilities and constants.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate table is served without refetching (1 hour).
    pub fn rate_freshness_window() -> Duration {
        Duration::milliseconds(3_600_000)
    }

    /// Upper bound on a single upstream rate fetch (5 seconds).
    pub fn rate_fetch_timeout() -> Duration {
        Duration::seconds(5)
    }
}

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// The Unix epoch, used as "never happened".
pub fn epoch() -> Timestamp {
    Utc.timestamp_millis_opt(0).single().unwrap_or_default()
}

/// Whether `timestamp` is less than `window` old.
pub fn is_within(timestamp: Timestamp, window: Duration) -> bool {
    now().signed_duration_since(timestamp) < window
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

/// Render a timestamp the way JavaScript's `toISOString` does.
pub fn to_iso_millis(timestamp: Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
