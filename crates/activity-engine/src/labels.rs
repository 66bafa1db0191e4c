//! Multi-label activity: which labels are active at each tick.
//!
//! Every label keeps a count of its open spans. A label becomes active when its
//! count leaves zero and inactive when it returns to zero, so overlapping spans for
//! the same label (two rotations putting one user on call) merge naturally.
//!
//! Boundaries from all labels share one sorted sequence. Several may land on the
//! same tick; all of them are applied before the active set is recomputed.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::boundary::{self, Boundary, LabeledBoundary};
use crate::error::{Misuse, Result};
use crate::iterator::SubIterator;
use crate::pool::BufferPool;
use crate::range::TickRange;
use crate::SpanPool;

/// Reports the set of active labels, in the order they became active.
#[derive(Debug)]
pub struct LabelCalculator {
    range: TickRange,
    pool: BufferPool<LabeledBoundary>,
    states: Vec<LabeledBoundary>,
    cursor: usize,

    ids: HashMap<String, usize>,
    names: Vec<String>,
    counts: Vec<u32>,
    active: Vec<usize>,

    finalized: bool,
    released: bool,
    observed: bool,
    changed: bool,
}

impl LabelCalculator {
    /// Create an unregistered calculator. Most callers want
    /// [`TimeIterator::new_label_calculator`](crate::TimeIterator::new_label_calculator).
    pub fn new(range: TickRange, pool: &SpanPool) -> Self {
        Self {
            range,
            pool: pool.labeled.clone(),
            states: pool.labeled.acquire(),
            cursor: 0,
            ids: HashMap::new(),
            names: Vec::new(),
            counts: Vec::new(),
            active: Vec::new(),
            finalized: false,
            released: false,
            observed: false,
            changed: false,
        }
    }

    /// Add the span `[start, end)` for `label`. `end == None` means the span never ends.
    ///
    /// Spans outside the range or with non-positive length are ignored.
    ///
    /// # Errors
    /// Returns `Misuse::SpanAfterFinalize` once [`finalize`](Self::finalize) was called.
    pub fn add_span(
        &mut self,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        label: &str,
    ) -> Result<()> {
        if self.released {
            return Err(Misuse::Released.into());
        }
        if self.finalized {
            return Err(Misuse::SpanAfterFinalize.into());
        }

        if !boundary::accepts(&self.range, start, end) {
            trace!(%start, ?end, label, "span outside range, skipping");
            return Ok(());
        }

        let label = self.intern(label);
        self.states.push(LabeledBoundary {
            label,
            boundary: Boundary::new(&self.range, start, true),
        });
        if let Some(end) = end {
            self.states.push(LabeledBoundary {
                label,
                boundary: Boundary::new(&self.range, end, false),
            });
        }

        Ok(())
    }

    fn intern(&mut self, label: &str) -> usize {
        if let Some(&id) = self.ids.get(label) {
            return id;
        }

        let id = self.names.len();
        self.ids.insert(label.to_string(), id);
        self.names.push(label.to_string());
        self.counts.push(0);
        id
    }

    /// Merge all labels' boundaries into one ascending sequence. Repeat calls are no-ops.
    ///
    /// The sort is stable, so boundaries on the same tick keep the order they were added in.
    pub fn finalize(&mut self) -> &mut Self {
        if self.finalized {
            return self;
        }
        self.finalized = true;

        self.states.sort_by_key(|b| b.boundary.time);
        debug!(
            boundaries = self.states.len(),
            labels = self.names.len(),
            "label calculator finalized"
        );

        self
    }

    /// Snapshot of the active labels in first-activated order.
    pub fn active_labels(&self) -> Vec<String> {
        self.active
            .iter()
            .map(|&id| self.names[id].clone())
            .collect()
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.ids
            .get(label)
            .is_some_and(|&id| self.counts[id] > 0)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// True if the active set differs from the previous tick.
    ///
    /// Always false on the first processed tick: whatever is active there was
    /// already active when observation began.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

impl SubIterator for LabelCalculator {
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

        let from = self.cursor;
        while let Some(b) = self.states.get(self.cursor).copied() {
            if b.boundary.time != tick {
                break;
            }
            let count = &mut self.counts[b.label];
            if b.boundary.is_start {
                *count += 1;
            } else {
                *count = count.saturating_sub(1);
            }
            self.cursor += 1;
        }

        let before = self.active.len();
        let counts = &self.counts;
        self.active.retain(|&id| counts[id] > 0);
        let mut changed = self.active.len() != before;

        for b in &self.states[from..self.cursor] {
            if b.boundary.is_start && self.counts[b.label] > 0 && !self.active.contains(&b.label)
            {
                self.active.push(b.label);
                changed = true;
            }
        }

        self.changed = changed && self.observed;
        self.observed = true;

        Ok(self.states.get(self.cursor).map(|b| b.boundary.time))
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
