//! End-to-end behavior of the rate limiter + retry executor, driven by a virtual clock.

use fingerprint_sdk::resilience::rate_limiter::MINUTE_WINDOW_MS;
use fingerprint_sdk::transport::TransportError;
use fingerprint_sdk::{
    CancellationToken, Error, ErrorKind, ManualClock, RateLimitConfig, RateLimitTracker,
    ResilientRequestExecutor, RetryConfig, SystemClock,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const T0: u64 = 1_700_000_000_000;

fn setup(per_minute: u32, per_hour: u32) -> (ResilientRequestExecutor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let tracker =
        RateLimitTracker::new(RateLimitConfig::new(per_minute, per_hour), clock.clone()).unwrap();
    (
        ResilientRequestExecutor::new(Arc::new(tracker), RetryConfig::default()),
        clock,
    )
}

fn network_failure() -> Error {
    Error::Transport(TransportError::Other("connection refused".into()))
}

#[tokio::test]
async fn test_concurrent_calls_beyond_minute_quota_are_rejected() {
    let (ex, clock) = setup(5, 100);

    let calls = (0..7).map(|i| ex.execute(move || async move { Ok::<_, Error>(i) }));
    let results = futures::future::join_all(calls).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let rejected: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .collect();
    assert_eq!(ok, 5);
    assert_eq!(rejected.len(), 2);
    for err in &rejected {
        match err {
            Error::RateLimitExceeded {
                next_allowed_at_ms,
                cause,
            } => {
                assert_eq!(*next_allowed_at_ms, T0 + MINUTE_WINDOW_MS);
                assert!(cause.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ex.tracker().snapshot().minute.count, 5);

    clock.advance(Duration::from_millis(MINUTE_WINDOW_MS));
    for _ in 0..2 {
        ex.execute(|| async { Ok::<_, Error>(()) }).await.unwrap();
    }
    let snap = ex.tracker().snapshot();
    assert_eq!(snap.minute.count, 2);
    assert_eq!(snap.hour.count, 7);
}

#[tokio::test]
async fn test_rejected_at_call_time_never_invokes_operation() {
    let (ex, _) = setup(1, 100);
    ex.tracker().track_request();

    let invoked = AtomicU32::new(0);
    let err = ex
        .execute(|| {
            invoked.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>(()) }
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_server_rate_limited_once_then_success() {
    let (ex, clock) = setup(10, 100);
    let attempts = AtomicU32::new(0);

    let v = ex
        .execute(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::ServerRateLimited {
                        retry_after_secs: Some(5),
                        message: "too many requests".into(),
                    })
                } else {
                    Ok("visit-id")
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(v, "visit-id");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(5)]);
    assert_eq!(ex.tracker().remaining_requests().minute, 8);
}

#[tokio::test]
async fn test_server_rate_limited_without_hint_waits_one_window() {
    let (ex, clock) = setup(10, 100);
    let attempts = AtomicU32::new(0);

    ex.execute(|| {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(Error::ServerRateLimited {
                    retry_after_secs: None,
                    message: String::new(),
                })
            } else {
                Ok(())
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(clock.sleeps(), vec![Duration::from_millis(60_000)]);
    // the wait pushed virtual time past the first window, so only the retry is counted
    assert_eq!(ex.tracker().snapshot().minute.count, 1);
}

#[tokio::test]
async fn test_network_failure_exhausts_with_doubling_delays() {
    let (ex, clock) = setup(10, 100);
    let attempts = AtomicU32::new(0);

    let err = ex
        .execute(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(network_failure()) }
        })
        .await
        .unwrap_err();

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_millis(1000),
            Duration::from_millis(2000),
            Duration::from_millis(4000),
        ]
    );
    match err {
        Error::MaxRetriesExceeded { attempts, source } => {
            assert_eq!(attempts, 4);
            assert_eq!(source.kind(), ErrorKind::NetworkFailure);
            assert!(source.to_string().contains("connection refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_custom_retry_budget() {
    let clock = Arc::new(ManualClock::new(T0));
    let tracker = Arc::new(RateLimitTracker::new(RateLimitConfig::new(10, 100), clock.clone()).unwrap());
    let ex = ResilientRequestExecutor::new(
        tracker,
        RetryConfig::new()
            .with_max_retries(1)
            .with_base_delay(Duration::from_millis(250)),
    );

    let err = ex
        .execute(|| async {
            Err::<(), _>(Error::Server {
                status: 502,
                message: "bad gateway".into(),
            })
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MaxRetriesExceeded);
    assert_eq!(err.status(), Some(502));
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(250)]);
}

#[tokio::test]
async fn test_cancel_during_backoff_stops_retrying() {
    let tracker = Arc::new(
        RateLimitTracker::new(RateLimitConfig::new(10, 100), Arc::new(SystemClock)).unwrap(),
    );
    let ex = ResilientRequestExecutor::new(
        tracker,
        RetryConfig::new().with_base_delay(Duration::from_secs(30)),
    );
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let attempts = AtomicU32::new(0);
    let started = Instant::now();
    let err = ex
        .execute_with_cancel(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(network_failure()) }
            },
            &token,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancel_abandons_inflight_operation() {
    let (ex, _) = setup(10, 100);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = ex
        .execute_with_cancel(|| futures::future::pending::<fingerprint_sdk::Result<()>>(), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    // the abandoned attempt was still admitted and counted
    assert_eq!(ex.tracker().snapshot().minute.count, 1);
}

#[test]
fn test_blocking_caller_sees_typed_outcomes() {
    let (ex, _) = setup(1, 1);
    let first = tokio_test::block_on(ex.execute(|| async { Ok::<_, Error>("ok") }));
    tokio_test::assert_ok!(first);

    let second = tokio_test::block_on(ex.execute(|| async { Ok::<_, Error>("ok") }));
    let err = tokio_test::assert_err!(second);
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    assert_eq!(ex.tracker().next_allowed_time(), T0 + MINUTE_WINDOW_MS);
}
