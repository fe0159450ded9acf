use booking_engine::{find_free_slots, validate, TimeInterval};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// A year of back-to-back 45-minute bookings with 15-minute breaks.
fn busy_year() -> Vec<TimeInterval> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    (0..(365 * 24))
        .map(|i| {
            TimeInterval::starting_at(base + Duration::hours(i), Duration::minutes(45)).unwrap()
        })
        .collect()
}

fn bench_validate(c: &mut Criterion) {
    let existing = busy_year();
    let base = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
    let free = TimeInterval::starting_at(base + Duration::minutes(45), Duration::minutes(15))
        .unwrap();
    let clash = TimeInterval::starting_at(base + Duration::minutes(30), Duration::minutes(30))
        .unwrap();

    c.bench_function("validate_accept_8760", |b| {
        b.iter(|| validate(black_box(&free), black_box(&existing)))
    });
    c.bench_function("validate_conflict_8760", |b| {
        b.iter(|| validate(black_box(&clash), black_box(&existing)))
    });
}

fn bench_free_slots(c: &mut Criterion) {
    let existing = busy_year();
    let window = TimeInterval::new(
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();

    c.bench_function("find_free_slots_month", |b| {
        b.iter(|| find_free_slots(black_box(&window), black_box(&existing), Duration::zero()))
    });
}

criterion_group!(benches, bench_validate, bench_free_slots);
criterion_main!(benches);
