//! Property-based tests for the label walk using proptest.
//!
//! Every visited tick is checked against a brute-force oracle that evaluates each
//! span directly, so skip-ahead can never hide a missed boundary.

use activity_engine::{label_timeline, LabeledSpan, SpanPool, TickRange};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 2, 0, 0, 0).unwrap()
}

fn arb_step() -> impl Strategy<Value = i64> {
    prop_oneof![Just(1i64), Just(60), Just(300), Just(900)]
}

fn arb_label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("alice".to_string()),
        Just("bob".to_string()),
        Just("carol".to_string()),
    ]
}

/// Spans within a few hours of the base, some unbounded, some inverted.
fn arb_span() -> impl Strategy<Value = LabeledSpan> {
    (0i64..14_400, prop::option::weighted(0.9, 0i64..14_400), arb_label()).prop_map(
        |(start, end, label)| LabeledSpan {
            start: base() + Duration::seconds(start),
            end: end.map(|e| base() + Duration::seconds(e)),
            label,
        },
    )
}

fn arb_range() -> impl Strategy<Value = (i64, i64, i64)> {
    (arb_step(), 0i64..7_200, 0i64..10_800)
        .prop_map(|(step, start, len)| (step, start, start + len))
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

fn truncate(t: i64, step: i64) -> i64 {
    t - t.rem_euclid(step)
}

fn expected_at(range: &TickRange, spans: &[LabeledSpan], tick: i64) -> BTreeSet<String> {
    let step = range.step_seconds();
    spans
        .iter()
        .filter(|s| {
            if let Some(end) = s.end {
                if end <= range.start() || end <= s.start {
                    return false;
                }
            }
            s.start < range.end()
        })
        .filter(|s| {
            let start = truncate(s.start.timestamp(), step).max(range.start_unix());
            let ended = s
                .end
                .is_some_and(|e| truncate(e.timestamp(), step) <= tick);
            start <= tick && !ended
        })
        .map(|s| s.label.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn walk_matches_oracle(
        (step, start, end) in arb_range(),
        spans in prop::collection::vec(arb_span(), 0..12),
    ) {
        let range = TickRange::new(
            base() + Duration::seconds(start),
            base() + Duration::seconds(end),
            Duration::seconds(step),
        )
        .unwrap();
        let pool = SpanPool::new();
        let samples = label_timeline(range, &spans, &pool).unwrap();

        for sample in &samples {
            let got: BTreeSet<String> = sample.labels.iter().cloned().collect();
            prop_assert_eq!(got.len(), sample.labels.len(), "duplicate label in active set");
            prop_assert_eq!(got, expected_at(&range, &spans, sample.time.timestamp()));
        }
    }

    #[test]
    fn ticks_are_increasing_and_bounded(
        (step, start, end) in arb_range(),
        spans in prop::collection::vec(arb_span(), 0..12),
    ) {
        let range = TickRange::new(
            base() + Duration::seconds(start),
            base() + Duration::seconds(end),
            Duration::seconds(step),
        )
        .unwrap();
        let pool = SpanPool::new();
        let samples = label_timeline(range, &spans, &pool).unwrap();

        prop_assert!(!samples.is_empty());
        prop_assert_eq!(samples[0].time, range.start());
        prop_assert_eq!(samples[samples.len() - 1].time, range.end());
        for pair in samples.windows(2) {
            prop_assert!(pair[0].time < pair[1].time);
            prop_assert_eq!(pair[1].time.timestamp() % step, 0);
        }
    }

    #[test]
    fn change_flag_matches_set_difference(
        (step, start, end) in arb_range(),
        spans in prop::collection::vec(arb_span(), 0..12),
    ) {
        let range = TickRange::new(
            base() + Duration::seconds(start),
            base() + Duration::seconds(end),
            Duration::seconds(step),
        )
        .unwrap();
        let pool = SpanPool::new();
        let samples = label_timeline(range, &spans, &pool).unwrap();

        prop_assert!(!samples[0].changed);
        for pair in samples.windows(2) {
            let before: BTreeSet<&String> = pair[0].labels.iter().collect();
            let after: BTreeSet<&String> = pair[1].labels.iter().collect();
            prop_assert_eq!(pair[1].changed, before != after);
        }
    }
}
