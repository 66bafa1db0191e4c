//! The driving time iterator.
//!
//! A [`TimeIterator`] owns a [`TickRange`] and a list of registered
//! [`SubIterator`]s. Each [`TimeIterator::advance`] call picks the next tick, hands
//! it to every sub-iterator and remembers the earliest tick any of them asked to be
//! woken at. Ticks nobody asked for are skipped, so the cost of a walk depends on
//! the number of span boundaries rather than the length of the range.
//!
//! `start` is always the first tick and `end` always the last. With no
//! sub-iterators registered there is nothing to skip ahead to, and the iterator
//! falls back to a dense walk of every step.

use chrono::{DateTime, Duration, Utc};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::active::ActiveCalculator;
use crate::error::{EngineError, Misuse, Result};
use crate::labels::LabelCalculator;
use crate::pool::SpanPool;
use crate::range::TickRange;

static NEXT_ITERATOR_ID: AtomicU64 = AtomicU64::new(1);

/// A per-metric calculator the driving iterator can advance generically.
pub trait SubIterator: Any {
    /// Observe `tick` and return the next tick this sub-iterator wants to be woken
    /// at, or `None` if its state will never change again.
    ///
    /// Ticks passed in are non-decreasing.
    fn process(&mut self, tick: i64) -> Result<Option<i64>>;

    /// Whether `process` may be called. Checked for every sub-iterator before any
    /// of them observes a tick, so a walk never advances only part of the way.
    fn check_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Give back pooled resources. The sub-iterator must not be used afterwards.
    fn release(&mut self) -> Result<()>;
}

/// Typed reference to a sub-iterator registered with a [`TimeIterator`].
pub struct Handle<T> {
    owner: u64,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("owner", &self.owner)
            .field("index", &self.index)
            .finish()
    }
}

/// Walks ticks over a [`TickRange`], driving every registered sub-iterator.
pub struct TimeIterator {
    id: u64,
    range: TickRange,
    pool: SpanPool,
    subs: Vec<Box<dyn SubIterator>>,
    current: Option<i64>,
    next: i64,
}

impl fmt::Debug for TimeIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeIterator")
            .field("id", &self.id)
            .field("range", &self.range)
            .field("subs", &self.subs.len())
            .field("current", &self.current)
            .field("next", &self.next)
            .finish()
    }
}

impl TimeIterator {
    /// Create an iterator over `[start, end]` with the given step.
    ///
    /// # Errors
    /// See [`TickRange::new`].
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
        pool: &SpanPool,
    ) -> Result<Self> {
        Ok(Self::from_range(TickRange::new(start, end, step)?, pool))
    }

    pub fn from_range(range: TickRange, pool: &SpanPool) -> Self {
        Self {
            id: NEXT_ITERATOR_ID.fetch_add(1, Ordering::Relaxed),
            range,
            pool: pool.clone(),
            subs: Vec::new(),
            current: None,
            next: range.start_unix(),
        }
    }

    pub fn range(&self) -> TickRange {
        self.range
    }

    /// Register a sub-iterator. Only allowed before the first [`advance`](Self::advance).
    ///
    /// # Errors
    /// Returns `Misuse::RegisterAfterStart` once walking has begun.
    pub fn register<S: SubIterator>(&mut self, sub: S) -> Result<Handle<S>> {
        if self.current.is_some() {
            return Err(Misuse::RegisterAfterStart.into());
        }

        self.subs.push(Box::new(sub));
        Ok(Handle {
            owner: self.id,
            index: self.subs.len() - 1,
            _marker: PhantomData,
        })
    }

    /// Create and register an on/off calculator bound to this iterator's range.
    pub fn new_active_calculator(&mut self) -> Result<Handle<ActiveCalculator>> {
        let calc = ActiveCalculator::new(self.range, &self.pool);
        self.register(calc)
    }

    /// Create and register a multi-label calculator bound to this iterator's range.
    pub fn new_label_calculator(&mut self) -> Result<Handle<LabelCalculator>> {
        let calc = LabelCalculator::new(self.range, &self.pool);
        self.register(calc)
    }

    /// Borrow a registered sub-iterator.
    ///
    /// # Errors
    /// Returns `EngineError::ForeignHandle` if `handle` was issued by another iterator.
    pub fn calculator<T: SubIterator>(&self, handle: Handle<T>) -> Result<&T> {
        if handle.owner != self.id {
            return Err(EngineError::ForeignHandle);
        }
        let any: &dyn Any = &**self
            .subs
            .get(handle.index)
            .ok_or(EngineError::ForeignHandle)?;
        any.downcast_ref::<T>().ok_or(EngineError::ForeignHandle)
    }

    /// Mutably borrow a registered sub-iterator.
    pub fn calculator_mut<T: SubIterator>(&mut self, handle: Handle<T>) -> Result<&mut T> {
        if handle.owner != self.id {
            return Err(EngineError::ForeignHandle);
        }
        let any: &mut dyn Any = &mut **self
            .subs
            .get_mut(handle.index)
            .ok_or(EngineError::ForeignHandle)?;
        any.downcast_mut::<T>().ok_or(EngineError::ForeignHandle)
    }

    /// Move to the next relevant tick. Returns `false` once `end` has been emitted.
    ///
    /// # Errors
    /// Propagates the first error returned by a sub-iterator's `process`, e.g.
    /// `Misuse::NotFinalized`.
    pub fn advance(&mut self) -> Result<bool> {
        if let Some(current) = self.current {
            if current >= self.range.end_unix() {
                return Ok(false);
            }
        }

        for sub in &self.subs {
            sub.check_ready()?;
        }

        let tick = self.next;
        let mut wake: Option<i64> = None;
        for sub in &mut self.subs {
            if let Some(t) = sub.process(tick)? {
                wake = Some(wake.map_or(t, |w| w.min(t)));
            }
        }

        let end = self.range.end_unix();
        self.next = match wake {
            Some(t) => t.clamp(tick, end),
            None if self.subs.is_empty() => (tick + self.range.step_seconds()).min(end),
            None => end,
        };
        self.current = Some(tick);

        Ok(true)
    }

    /// The current tick in Unix seconds, or the range start before the first advance.
    pub fn current_tick(&self) -> i64 {
        self.current.unwrap_or(self.range.start_unix())
    }

    /// The current tick as a timestamp.
    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.current_tick(), 0)
    }

    /// Release every registered sub-iterator.
    ///
    /// All sub-iterators are released even if one fails; the first error is returned.
    /// Dropping an iterator without closing it releases whatever can be released and
    /// discards the errors.
    pub fn close(mut self) -> Result<()> {
        let mut subs = std::mem::take(&mut self.subs);
        debug!(
            iterator = self.id,
            subs = subs.len(),
            "releasing sub-iterators"
        );

        let mut first_err = None;
        for sub in &mut subs {
            if let Err(e) = sub.release() {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for TimeIterator {
    fn drop(&mut self) {
        if self.subs.is_empty() {
            return;
        }

        debug!(
            iterator = self.id,
            subs = self.subs.len(),
            "iterator dropped without close, releasing sub-iterators"
        );
        for sub in &mut self.subs {
            let _ = sub.release();
        }
    }
}
