//! Time source for history timestamps.
//!
//! The stockroom runs on Albania wall-clock time, pinned at UTC+1 with no
//! daylight-saving adjustment.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// Display and storage format for history timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ALBANIA_OFFSET_SECS: i32 = 3600;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current time rendered in [`TIMESTAMP_FORMAT`].
    fn timestamp(&self) -> String {
        format_timestamp(&self.now())
    }
}

/// System clock shifted to a fixed UTC+1 offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlbaniaClock;

impl Clock for AlbaniaClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&albania_offset())
    }
}

/// Clock frozen at a single instant (for tests and replays).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parse a `YYYY-MM-DD HH:MM:SS` wall-clock time in the UTC+1 zone.
    pub fn at(wall_clock: &str) -> Result<Self, chrono::ParseError> {
        let naive = NaiveDateTime::parse_from_str(wall_clock, TIMESTAMP_FORMAT)?;
        let utc = naive - Duration::seconds(i64::from(ALBANIA_OFFSET_SECS));
        Ok(Self(albania_offset().from_utc_datetime(&utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Render a timestamp the way history records store it.
pub fn format_timestamp(time: &DateTime<FixedOffset>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

fn albania_offset() -> FixedOffset {
    // 3600s is always within FixedOffset's +/-86400s range.
    FixedOffset::east_opt(ALBANIA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}
