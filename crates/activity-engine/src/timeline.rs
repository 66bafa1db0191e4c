//! Collect a whole walk in one call.
//!
//! These helpers run the full lifecycle (build an iterator, feed spans, finalize,
//! walk every tick, release) for the common case of a single calculator, and return
//! one serializable sample per visited tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::iterator::TimeIterator;
use crate::pool::SpanPool;
use crate::range::TickRange;

/// A `[start, end)` span. A missing `end` means the span never ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// A [`Span`] belonging to a label (a user, a service, a rotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSpan {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    pub label: String,
}

/// On/off state at one visited tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSample {
    pub time: DateTime<Utc>,
    pub active: bool,
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_since: Option<DateTime<Utc>>,
}

/// Active labels at one visited tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSample {
    pub time: DateTime<Utc>,
    pub labels: Vec<String>,
    pub changed: bool,
}

/// Merge `spans` into an on/off timeline over `range`.
///
/// Spans are fed in start order so back-to-back spans are joined regardless of
/// the order they were supplied in.
pub fn flag_timeline(range: TickRange, spans: &[Span], pool: &SpanPool) -> Result<Vec<FlagSample>> {
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by_key(|s| s.start);

    let mut iter = TimeIterator::from_range(range, pool);
    let handle = iter.new_active_calculator()?;
    let calc = iter.calculator_mut(handle)?;
    for span in ordered {
        calc.add_span(span.start, span.end)?;
    }
    calc.finalize();

    let mut samples = Vec::new();
    while iter.advance()? {
        let calc = iter.calculator(handle)?;
        samples.push(FlagSample {
            time: tick_time(iter.current_tick())?,
            active: calc.is_active(),
            changed: calc.changed(),
            active_since: calc.active_since(),
        });
    }

    iter.close()?;
    Ok(samples)
}

/// Merge labeled `spans` into an active-label timeline over `range`.
pub fn label_timeline(
    range: TickRange,
    spans: &[LabeledSpan],
    pool: &SpanPool,
) -> Result<Vec<LabelSample>> {
    let mut iter = TimeIterator::from_range(range, pool);
    let handle = iter.new_label_calculator()?;
    let calc = iter.calculator_mut(handle)?;
    for span in spans {
        calc.add_span(span.start, span.end, &span.label)?;
    }
    calc.finalize();

    let mut samples = Vec::new();
    while iter.advance()? {
        let calc = iter.calculator(handle)?;
        samples.push(LabelSample {
            time: tick_time(iter.current_tick())?,
            labels: calc.active_labels(),
            changed: calc.changed(),
        });
    }

    iter.close()?;
    Ok(samples)
}

fn tick_time(tick: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(tick, 0).ok_or(EngineError::TimestampOutOfRange(tick))
}
