//! # activity-engine
//!
//! Discrete-time interval merging for on-call style activity questions.
//!
//! A [`TimeIterator`] walks quantized ticks over a fixed range. Calculators bound to
//! it merge independently supplied `[start, end)` spans and report derived state at
//! each visited tick: a single on/off flag ([`ActiveCalculator`]) or an ordered set of
//! active labels ([`LabelCalculator`]). Instead of stepping one unit at a time, the
//! iterator skips straight to the next tick any calculator cares about.
//!
//! ## Quick start
//!
//! ```rust
//! use activity_engine::{SpanPool, TimeIterator};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let pool = SpanPool::new();
//! let start = Utc.with_ymd_and_hms(2000, 1, 2, 3, 4, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2000, 1, 2, 3, 8, 0).unwrap();
//! let mut iter = TimeIterator::new(start, end, Duration::minutes(1), &pool).unwrap();
//!
//! let users = iter.new_label_calculator().unwrap();
//! let calc = iter.calculator_mut(users).unwrap();
//! calc.add_span(start + Duration::minutes(1), Some(start + Duration::minutes(3)), "foo")
//!     .unwrap();
//! calc.finalize();
//!
//! let mut seen = Vec::new();
//! while iter.advance().unwrap() {
//!     seen.push((iter.current_tick(), iter.calculator(users).unwrap().active_labels()));
//! }
//! assert_eq!(seen.len(), 4);
//! assert_eq!(seen[1].1, vec!["foo".to_string()]);
//! iter.close().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`iterator`] — the driving [`TimeIterator`] and the [`SubIterator`] capability
//! - [`active`] — binary on/off calculator
//! - [`labels`] — multi-label calculator with per-label reference counting
//! - [`boundary`] — span endpoints, skip and clamp rules
//! - [`range`] — validated, quantized `(start, end, step)` triple
//! - [`pool`] — thread-safe free list of boundary buffers
//! - [`config`] — serde-friendly walk configuration
//! - [`timeline`] — one-call helpers that collect a whole walk
//! - [`error`] — Error types

pub mod active;
pub mod boundary;
pub mod config;
pub mod error;
pub mod iterator;
pub mod labels;
pub mod pool;
pub mod range;
pub mod timeline;

pub use active::ActiveCalculator;
pub use config::WalkConfig;
pub use error::{EngineError, Misuse, Result};
pub use iterator::{Handle, SubIterator, TimeIterator};
pub use labels::LabelCalculator;
pub use pool::SpanPool;
pub use range::TickRange;
pub use timeline::{flag_timeline, label_timeline, FlagSample, LabelSample, LabeledSpan, Span};
