//! Benchmarks for the rate limit tracker and executor admission path
//!
//! This benchmark measures:
//! - Uncontended `try_acquire` cost
//! - Read-only quota queries
//! - Full `execute` overhead with an immediately-ready operation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fingerprint_sdk::{
    Error, ManualClock, RateLimitConfig, RateLimitTracker, ResilientRequestExecutor, RetryConfig,
};
use std::sync::Arc;

fn tracker() -> Arc<RateLimitTracker> {
    Arc::new(
        RateLimitTracker::new(
            RateLimitConfig::new(u32::MAX, u32::MAX),
            Arc::new(ManualClock::new(0)),
        )
        .expect("valid limits"),
    )
}

fn bench_tracker(c: &mut Criterion) {
    let t = tracker();
    c.bench_function("tracker_try_acquire", |b| {
        b.iter(|| black_box(t.try_acquire()))
    });
    c.bench_function("tracker_remaining_requests", |b| {
        b.iter(|| black_box(t.remaining_requests()))
    });
    c.bench_function("tracker_next_allowed_time", |b| {
        b.iter(|| black_box(t.next_allowed_time()))
    });
}

fn bench_execute(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let ex = ResilientRequestExecutor::new(tracker(), RetryConfig::default());
    let ex = &ex;
    c.bench_function("executor_execute_ready", |b| {
        b.to_async(&rt).iter(move || async move {
            black_box(ex.execute(|| async { Ok::<_, Error>(1u32) }).await)
        })
    });
}

criterion_group!(benches, bench_tracker, bench_execute);
criterion_main!(benches);
