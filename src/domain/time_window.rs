// Time window domain model and the recompute fingerprint derived from it
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::Serialize;
use thiserror::Error;

/// Longest accepted window: one leap year of hourly samples
pub const MAX_WINDOW_HOURS: i64 = 366 * 24;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("window start {start} is after its end {end}")]
    StartAfterEnd {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("window spans {hours} hours, at most {max} are allowed")]
    TooLong { hours: i64, max: i64 },
}

/// The instant or interval the user is looking at
///
/// In point mode (`is_range == false`) only `start` is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    is_range: bool,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, is_range: bool) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::StartAfterEnd { start, end });
        }
        let hours = (end - start).num_hours();
        if hours > MAX_WINDOW_HOURS {
            return Err(WindowError::TooLong {
                hours,
                max: MAX_WINDOW_HOURS,
            });
        }
        Ok(Self { start, end, is_range })
    }

    pub fn point(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            end: at,
            is_range: false,
        }
    }

    /// A point window at the current hour, the state of a fresh session
    pub fn current_hour() -> Self {
        let now = Utc::now();
        Self::point(now.duration_trunc(Duration::hours(1)).unwrap_or(now))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_range(&self) -> bool {
        self.is_range
    }

    /// Bounds sent to the series source: `(start, start)` in point mode
    pub fn query_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        if self.is_range {
            (self.start, self.end)
        } else {
            (self.start, self.start)
        }
    }

    /// Whole hours covered by the queried bounds
    pub fn query_hours(&self) -> i64 {
        let (start, end) = self.query_bounds();
        (end - start).num_hours()
    }
}

/// Fingerprint of the inputs that make a recompute pass meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecomputeKey {
    start_ms: i64,
    end_ms: i64,
    is_range: bool,
    polygon_count: usize,
}

impl RecomputeKey {
    pub fn new(window: &TimeWindow, polygon_count: usize) -> Self {
        Self {
            start_ms: window.start.timestamp_millis(),
            end_ms: window.end.timestamp_millis(),
            is_range: window.is_range,
            polygon_count,
        }
    }
}
