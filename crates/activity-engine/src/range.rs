//! The validated `(start, end, step)` triple every calculator quantizes against.

use chrono::{DateTime, Duration, Utc};

use crate::error::{EngineError, Result};

/// An inclusive tick range with a fixed step, all in whole Unix seconds.
///
/// `start` and `end` are truncated down to a multiple of `step` on construction,
/// so both are themselves valid ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRange {
    start: i64,
    end: i64,
    step: i64,
}

impl TickRange {
    /// Build a range from wall-clock bounds.
    ///
    /// Any sub-second part of `step` is discarded.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidStep` if `step` is shorter than one second.
    /// Returns `EngineError::InvalidRange` if `end` truncates to before `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Result<Self> {
        Self::from_unix(start.timestamp(), end.timestamp(), step.num_seconds())
    }

    /// Build a range from Unix seconds.
    ///
    /// # Errors
    /// Same as [`TickRange::new`], plus `EngineError::TimestampOutOfRange` if a
    /// truncated bound cannot be represented as a `DateTime<Utc>`.
    pub fn from_unix(start: i64, end: i64, step: i64) -> Result<Self> {
        if step < 1 {
            return Err(EngineError::InvalidStep(step));
        }

        let start = truncate(start, step);
        let end = truncate(end, step);
        if end < start {
            return Err(EngineError::InvalidRange { start, end });
        }
        for t in [start, end] {
            if DateTime::from_timestamp(t, 0).is_none() {
                return Err(EngineError::TimestampOutOfRange(t));
            }
        }

        Ok(Self { start, end, step })
    }

    /// First tick, in Unix seconds.
    pub fn start_unix(&self) -> i64 {
        self.start
    }

    /// Final tick, in Unix seconds.
    pub fn end_unix(&self) -> i64 {
        self.end
    }

    /// Step, in seconds.
    pub fn step_seconds(&self) -> i64 {
        self.step
    }

    pub fn start(&self) -> DateTime<Utc> {
        to_time(self.start)
    }

    pub fn end(&self) -> DateTime<Utc> {
        to_time(self.end)
    }

    pub fn step(&self) -> Duration {
        Duration::seconds(self.step)
    }

    /// Truncate `t` down to the nearest tick.
    pub fn quantize(&self, t: DateTime<Utc>) -> i64 {
        truncate(t.timestamp(), self.step)
    }

    /// Number of ticks a dense walk over this range would visit.
    pub fn tick_count(&self) -> i64 {
        (self.end - self.start) / self.step + 1
    }
}

fn truncate(t: i64, step: i64) -> i64 {
    t - t.rem_euclid(step)
}

// Bounds are checked for representability in `from_unix`.
fn to_time(t: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(t, 0).unwrap_or_default()
}
