//! Walk configuration as it arrives from callers (JSON requests, config files).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::range::TickRange;

/// Step used when a configuration omits `step_seconds`.
pub const DEFAULT_STEP_SECONDS: i64 = 60;

fn default_step_seconds() -> i64 {
    DEFAULT_STEP_SECONDS
}

/// The range and granularity of a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// First tick (RFC 3339, truncated to the step).
    pub start: DateTime<Utc>,
    /// Last tick, inclusive (RFC 3339, truncated to the step).
    pub end: DateTime<Utc>,
    #[serde(default = "default_step_seconds")]
    pub step_seconds: i64,
}

impl WalkConfig {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            step_seconds: DEFAULT_STEP_SECONDS,
        }
    }

    pub fn with_step_seconds(mut self, step_seconds: i64) -> Self {
        self.step_seconds = step_seconds;
        self
    }

    /// Validate and convert to a [`TickRange`].
    ///
    /// # Errors
    /// Returns `EngineError::Config` if `step_seconds` is not positive, and
    /// `EngineError::InvalidRange` if `end` is before `start`.
    pub fn range(&self) -> Result<TickRange> {
        if self.step_seconds < 1 {
            return Err(EngineError::Config(format!(
                "step_seconds must be at least 1, got {}",
                self.step_seconds
            )));
        }

        TickRange::new(self.start, self.end, Duration::seconds(self.step_seconds))
    }
}
