//! Span endpoints and the rules that decide which spans reach a calculator.
//!
//! Span producers routinely hand over spans that are empty or only partly inside
//! the walked range. Those are not errors: [`accepts`] filters them out and
//! [`Boundary::new`] clamps starts that precede the range so the span still reads
//! as active from the first tick.

use chrono::{DateTime, Utc};

use crate::range::TickRange;

/// One endpoint of a span, quantized to a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Quantized tick, clamped to the range start for early starts.
    pub time: i64,
    pub is_start: bool,
    /// Quantized tick before clamping (e.g. a historic shift start).
    pub original: i64,
}

impl Boundary {
    pub fn new(range: &TickRange, t: DateTime<Utc>, is_start: bool) -> Self {
        let original = range.quantize(t);
        let time = if is_start && original < range.start_unix() {
            range.start_unix()
        } else {
            original
        };

        Self {
            time,
            is_start,
            original,
        }
    }
}

/// A [`Boundary`] tagged with an interned label id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledBoundary {
    pub label: usize,
    pub boundary: Boundary,
}

/// Whether the span `[start, end)` contributes anything to `range`.
///
/// `end == None` is an unbounded span. A span is dropped when it ends at or
/// before the range start, has non-positive length, or starts at or after the
/// range end.
pub fn accepts(range: &TickRange, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
    if let Some(end) = end {
        if end <= range.start() || end <= start {
            return false;
        }
    }

    start < range.end()
}
