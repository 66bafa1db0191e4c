use activity_engine::{label_timeline, LabeledSpan, SpanPool, TickRange};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// A month of 12-hour shifts for a handful of users on a one-minute step.
fn month_of_shifts() -> (TickRange, Vec<LabeledSpan>) {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);
    let range = TickRange::new(start, end, Duration::minutes(1)).unwrap();

    let users = ["alice", "bob", "carol", "dave"];
    let spans = (0..60)
        .map(|i| {
            let shift_start = start + Duration::hours(12 * i);
            LabeledSpan {
                start: shift_start,
                end: Some(shift_start + Duration::hours(12)),
                label: users[i as usize % users.len()].to_string(),
            }
        })
        .collect();

    (range, spans)
}

fn bench_label_walk(c: &mut Criterion) {
    let (range, spans) = month_of_shifts();
    let pool = SpanPool::new();

    c.bench_function("label_walk_month", |b| {
        b.iter(|| label_timeline(black_box(range), black_box(&spans), &pool).unwrap())
    });
}

criterion_group!(benches, bench_label_walk);
criterion_main!(benches);
