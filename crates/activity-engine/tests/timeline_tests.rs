//! Tests for the one-call timeline helpers and walk configuration.

use activity_engine::{
    flag_timeline, label_timeline, EngineError, FlagSample, LabeledSpan, Span, SpanPool,
    WalkConfig,
};
use chrono::{DateTime, TimeZone, Utc};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 2, h, m, 0).unwrap()
}

fn span(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Span {
    Span { start, end }
}

fn labeled(start: DateTime<Utc>, end: Option<DateTime<Utc>>, label: &str) -> LabeledSpan {
    LabeledSpan {
        start,
        end,
        label: label.to_string(),
    }
}

fn config() -> WalkConfig {
    WalkConfig::new(at(3, 4), at(3, 8))
}

// ── Flag timeline ───────────────────────────────────────────────────────────

#[test]
fn flag_timeline_reports_active_since() {
    let pool = SpanPool::new();
    let range = config().range().unwrap();
    let samples = flag_timeline(range, &[span(at(3, 1), Some(at(3, 6)))], &pool).unwrap();

    assert_eq!(
        samples,
        vec![
            FlagSample {
                time: at(3, 4),
                active: true,
                changed: true,
                active_since: Some(at(3, 1)),
            },
            FlagSample {
                time: at(3, 6),
                active: false,
                changed: true,
                active_since: None,
            },
            FlagSample {
                time: at(3, 8),
                active: false,
                changed: false,
                active_since: None,
            },
        ]
    );
}

#[test]
fn flag_timeline_joins_adjacent_spans_given_out_of_order() {
    let pool = SpanPool::new();
    let range = config().range().unwrap();
    let samples = flag_timeline(
        range,
        &[
            span(at(3, 6), Some(at(3, 7))),
            span(at(3, 5), Some(at(3, 6))),
        ],
        &pool,
    )
    .unwrap();

    let states: Vec<(DateTime<Utc>, bool)> =
        samples.iter().map(|s| (s.time, s.active)).collect();
    assert_eq!(
        states,
        vec![
            (at(3, 4), false),
            (at(3, 5), true),
            (at(3, 7), false),
            (at(3, 8), false),
        ]
    );
}

#[test]
fn flag_timeline_returns_buffer_to_pool() {
    let pool = SpanPool::new();
    let range = config().range().unwrap();
    flag_timeline(range, &[span(at(3, 5), None)], &pool).unwrap();
    assert_eq!(pool.idle_boundaries(), 1);
}

// ── Label timeline ──────────────────────────────────────────────────────────

#[test]
fn label_timeline_matches_walk() {
    let pool = SpanPool::new();
    let range = config().range().unwrap();
    let samples = label_timeline(
        range,
        &[
            labeled(at(3, 5), Some(at(3, 7)), "foo"),
            labeled(at(3, 6), Some(at(3, 7)), "bar"),
        ],
        &pool,
    )
    .unwrap();

    let labels: Vec<Vec<String>> = samples.iter().map(|s| s.labels.clone()).collect();
    assert_eq!(
        labels,
        vec![
            vec![],
            vec!["foo".to_string()],
            vec!["foo".to_string(), "bar".to_string()],
            vec![],
            vec![],
        ]
    );
    assert_eq!(samples[2].time, at(3, 6));
    assert!(samples[2].changed);
}

#[test]
fn samples_serialize_as_rfc3339() {
    let pool = SpanPool::new();
    let range = config().range().unwrap();
    let samples = label_timeline(range, &[labeled(at(3, 5), None, "foo")], &pool).unwrap();

    let json = serde_json::to_value(&samples[1]).unwrap();
    assert_eq!(json["time"], "2000-01-02T03:05:00Z");
    assert_eq!(json["labels"], serde_json::json!(["foo"]));
    assert_eq!(json["changed"], true);
}

#[test]
fn inactive_flag_sample_omits_active_since() {
    let pool = SpanPool::new();
    let range = config().range().unwrap();
    let samples = flag_timeline(range, &[], &pool).unwrap();

    let json = serde_json::to_value(&samples[0]).unwrap();
    assert!(json.get("active_since").is_none());
}

// ── Configuration ───────────────────────────────────────────────────────────

#[test]
fn config_defaults_step_to_one_minute() {
    let config: WalkConfig = serde_json::from_str(
        r#"{"start":"2000-01-02T03:04:00Z","end":"2000-01-02T03:08:00Z"}"#,
    )
    .unwrap();

    assert_eq!(config.step_seconds, 60);
    let range = config.range().unwrap();
    assert_eq!(range.tick_count(), 5);
}

#[test]
fn config_spans_deserialize_with_optional_end() {
    let spans: Vec<LabeledSpan> = serde_json::from_str(
        r#"[
            {"start":"2000-01-02T03:05:00Z","end":"2000-01-02T03:07:00Z","label":"foo"},
            {"start":"2000-01-02T03:06:00Z","label":"bar"}
        ]"#,
    )
    .unwrap();

    assert_eq!(spans[0].end, Some(at(3, 7)));
    assert_eq!(spans[1].end, None);
}

#[test]
fn config_rejects_non_positive_step() {
    let err = config().with_step_seconds(0).range().unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn config_rejects_inverted_range() {
    let err = WalkConfig::new(at(3, 8), at(3, 4)).range().unwrap_err();
    assert!(matches!(err, EngineError::InvalidRange { .. }));
}

#[test]
fn coarser_step_quantizes_spans() {
    let pool = SpanPool::new();
    let range = WalkConfig::new(at(3, 0), at(4, 0))
        .with_step_seconds(15 * 60)
        .range()
        .unwrap();
    let samples = label_timeline(range, &[labeled(at(3, 20), Some(at(3, 50)), "foo")], &pool)
        .unwrap();

    let times: Vec<DateTime<Utc>> = samples.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![at(3, 0), at(3, 15), at(3, 45), at(4, 0)]);
    assert_eq!(samples[1].labels, vec!["foo".to_string()]);
    assert!(samples[2].labels.is_empty());
}
