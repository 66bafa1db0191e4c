//! Free list of boundary buffers shared across calculators.
//!
//! Calculators sort and drain a `Vec` of boundaries once per walk. Walks are short
//! and frequent, so the vectors are recycled instead of reallocated: a calculator
//! acquires a buffer on construction and hands it back on release.
//!
//! A [`SpanPool`] is cheap to clone (every clone shares the same queues) and is safe
//! to use from several threads at once, so independent iterators running on
//! separate threads can draw from one pool. Each queue is a lock-free
//! `crossbeam::queue::SegQueue`; the idle count is bounded so a burst of large
//! walks cannot pin memory forever.

use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::boundary::{Boundary, LabeledBoundary};

/// Capacity of a freshly allocated buffer.
pub const DEFAULT_CAPACITY: usize = 100;

/// Maximum number of idle buffers kept per queue.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Bounded lock-free queue of empty `Vec<T>` buffers.
#[derive(Debug)]
pub struct BufferPool<T> {
    queue: Arc<SegQueue<Vec<T>>>,
    idle: Arc<AtomicUsize>,
    max_idle: usize,
}

// Manual impl: cloning shares the queue and must not require `T: Clone`.
impl<T> Clone for BufferPool<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            idle: Arc::clone(&self.idle),
            max_idle: self.max_idle,
        }
    }
}

impl<T> BufferPool<T> {
    pub fn new(max_idle: usize) -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
            idle: Arc::new(AtomicUsize::new(0)),
            max_idle,
        }
    }

    /// Take an empty buffer, reusing an idle one when available.
    pub fn acquire(&self) -> Vec<T> {
        match self.queue.pop() {
            Some(buf) => {
                self.idle.fetch_sub(1, Ordering::Relaxed);
                buf
            }
            None => Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Return a buffer. It is cleared first; if the pool is full it is dropped.
    pub fn release(&self, mut buf: Vec<T>) {
        buf.clear();

        let mut current = self.idle.load(Ordering::Relaxed);
        while current < self.max_idle {
            match self.idle.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.queue.push(buf);
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Number of idle buffers currently queued.
    pub fn idle(&self) -> usize {
        self.idle.load(Ordering::Relaxed)
    }
}

/// The pools backing [`ActiveCalculator`](crate::ActiveCalculator) and
/// [`LabelCalculator`](crate::LabelCalculator).
///
/// Create one per context that builds iterators (a service, a worker, a test) and
/// pass it to [`TimeIterator::new`](crate::TimeIterator::new).
#[derive(Debug, Clone)]
pub struct SpanPool {
    pub(crate) boundaries: BufferPool<Boundary>,
    pub(crate) labeled: BufferPool<LabeledBoundary>,
}

impl SpanPool {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            boundaries: BufferPool::new(max_idle),
            labeled: BufferPool::new(max_idle),
        }
    }

    /// Idle buffers available to binary calculators.
    pub fn idle_boundaries(&self) -> usize {
        self.boundaries.idle()
    }

    /// Idle buffers available to label calculators.
    pub fn idle_labeled(&self) -> usize {
        self.labeled.idle()
    }
}

impl Default for SpanPool {
    fn default() -> Self {
        Self::new()
    }
}
