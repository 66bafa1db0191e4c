//! Binary activity: merge spans into a single on/off timeline.
//!
//! Spans are flattened into boundaries, sorted once on [`ActiveCalculator::finalize`]
//! and then consumed one boundary per matching tick. The calculator is meant for
//! spans of one kind that do not overlap, such as the shifts of a single user.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::boundary::{self, Boundary};
use crate::error::{Misuse, Result};
use crate::iterator::SubIterator;
use crate::pool::BufferPool;
use crate::range::TickRange;
use crate::SpanPool;

/// Reports whether the current tick is inside any span.
///
/// Back-to-back spans are joined: a start landing on the same tick as the
/// previously added boundary cancels that boundary instead of being recorded.
/// Callers should add spans in chronological order for this to take effect.
#[derive(Debug)]
pub struct ActiveCalculator {
    range: TickRange,
    pool: BufferPool<Boundary>,
    states: Vec<Boundary>,
    cursor: usize,

    finalized: bool,
    released: bool,
    active: Option<Boundary>,
    changed: bool,
}

impl ActiveCalculator {
    /// Create an unregistered calculator. Most callers want
    /// [`TimeIterator::new_active_calculator`](crate::TimeIterator::new_active_calculator).
    pub fn new(range: TickRange, pool: &SpanPool) -> Self {
        Self {
            range,
            pool: pool.boundaries.clone(),
            states: pool.boundaries.acquire(),
            cursor: 0,
            finalized: false,
            released: false,
            active: None,
            changed: false,
        }
    }

    /// Add the span `[start, end)`. `end == None` means the span never ends.
    ///
    /// Spans outside the range or with non-positive length are ignored.
    ///
    /// # Errors
    /// Returns `Misuse::SpanAfterFinalize` once [`finalize`](Self::finalize) was called.
    pub fn add_span(&mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<()> {
        if self.released {
            return Err(Misuse::Released.into());
        }
        if self.finalized {
            return Err(Misuse::SpanAfterFinalize.into());
        }

        if !boundary::accepts(&self.range, start, end) {
            trace!(%start, ?end, "span outside range, skipping");
            return Ok(());
        }

        self.push(Boundary::new(&self.range, start, true));
        if let Some(end) = end {
            self.push(Boundary::new(&self.range, end, false));
        }

        Ok(())
    }

    fn push(&mut self, b: Boundary) {
        if b.is_start && self.states.last().is_some_and(|last| last.time == b.time) {
            self.states.pop();
            return;
        }

        self.states.push(b);
    }

    /// Sort the collected boundaries. Must be called after the last
    /// [`add_span`](Self::add_span) and before the first tick; repeat calls are no-ops.
    pub fn finalize(&mut self) -> &mut Self {
        if self.finalized {
            return self;
        }
        self.finalized = true;

        self.states.sort_by_key(|b| b.time);
        debug!(boundaries = self.states.len(), "active calculator finalized");

        self
    }

    /// True if the current tick is inside a span.
    pub fn is_active(&self) -> bool {
        self.active.is_some_and(|b| b.is_start)
    }

    /// True only on the tick where a boundary was just consumed.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Start of the current span, quantized but not clamped to the range.
    ///
    /// `None` when inactive.
    pub fn active_since(&self) -> Option<DateTime<Utc>> {
        self.active
            .filter(|b| b.is_start)
            .and_then(|b| DateTime::from_timestamp(b.original, 0))
    }

    /// Number of boundaries not yet consumed.
    pub fn pending(&self) -> usize {
        self.states.len() - self.cursor
    }
}

impl SubIterator for ActiveCalculator {
    fn check_ready(&self) -> Result<()> {
        if self.released {
            return Err(Misuse::Released.into());
        }
        if !self.finalized {
            return Err(Misuse::NotFinalized.into());
        }
        Ok(())
    }

    fn process(&mut self, tick: i64) -> Result<Option<i64>> {
        self.check_ready()?;

        let Some(next) = self.states.get(self.cursor).copied() else {
            self.changed = false;
            return Ok(None);
        };

        self.changed = next.time == tick;
        if !self.changed {
            return Ok(Some(next.time));
        }

        self.active = Some(next);
        self.cursor += 1;

        Ok(self.states.get(self.cursor).map(|b| b.time))
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(Misuse::Released.into());
        }
        if !self.finalized {
            return Err(Misuse::ReleaseBeforeFinalize.into());
        }
        self.released = true;

        self.pool.release(std::mem::take(&mut self.states));
        self.cursor = 0;

        Ok(())
    }
}
