// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `scheduler.rs`

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::reconciler::PassOutcome;
    use crate::scheduler::{run, run_loop};
    use crate::sync_errors::{ControllerError, SyncError};
    use crate::test_fakes::{app, route, test_config, FakeDnsProvider, FakeRouteSource};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    const PERIOD: Duration = Duration::from_secs(600);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_runs_immediately() {
        let started = Instant::now();
        let first_pass_at = Arc::new(Mutex::new(None));

        let passes = run_loop(PERIOD, sleep(secs(1)), || {
            let first_pass_at = first_pass_at.clone();
            async move {
                first_pass_at
                    .lock()
                    .expect("lock")
                    .get_or_insert(Instant::now());
                Ok::<_, SyncError>(PassOutcome::NoRoutes)
            }
        })
        .await;

        assert_eq!(passes, 1);
        let at = first_pass_at.lock().expect("lock").expect("pass ran");
        assert!(at.duration_since(started) < secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_follow_the_period() {
        let count = Arc::new(AtomicUsize::new(0));

        let passes = run_loop(PERIOD, sleep(secs(1250)), || {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SyncError>(PassOutcome::UpToDate { desired: 1 })
            }
        })
        .await;

        // t=0, t=600, t=1200
        assert_eq!(passes, 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_pass_delays_next_instead_of_overlapping() {
        let started = Instant::now();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let passes = run_loop(PERIOD, sleep(secs(2000)), || {
            let in_flight = in_flight.clone();
            let max_in_flight = max_in_flight.clone();
            let starts = starts.clone();
            async move {
                starts
                    .lock()
                    .expect("lock")
                    .push(Instant::now().duration_since(started).as_secs());
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                sleep(secs(900)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, SyncError>(PassOutcome::NoRoutes)
            }
        })
        .await;

        assert_eq!(passes, 3);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(*starts.lock().expect("lock"), vec![0, 900, 1800]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_passes_do_not_stop_the_loop() {
        let passes = run_loop(PERIOD, sleep(secs(1250)), || async {
            Err::<PassOutcome, _>(SyncError::Controller(ControllerError::ListAppsFailed {
                endpoint: "https://controller.example.com/apps".to_string(),
                reason: "connection refused".to_string(),
            }))
        })
        .await;

        assert_eq!(passes, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_running_pass() {
        let finished = Arc::new(AtomicBool::new(false));

        let passes = run_loop(PERIOD, sleep(secs(50)), || {
            let finished = finished.clone();
            async move {
                sleep(secs(100)).await;
                finished.store(true, Ordering::SeqCst);
                Ok::<_, SyncError>(PassOutcome::NoRoutes)
            }
        })
        .await;

        assert_eq!(passes, 1);
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_tick_runs_nothing() {
        let passes = run_loop(PERIOD, std::future::ready(()), || async {
            Ok::<_, SyncError>(PassOutcome::NoRoutes)
        })
        .await;

        assert_eq!(passes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reconciles_context() {
        let routes =
            FakeRouteSource::default().with_app(app("web"), vec![route("web.example.com")]);
        let provider = Arc::new(FakeDnsProvider::with_zone("z1", "example.com"));
        let ctx = Context::with_clients(test_config(), Arc::new(routes), provider.clone());

        // default interval is 600s: passes at t=0 and t=600
        let passes = run(&ctx, sleep(secs(700))).await;

        assert_eq!(passes, 2);
        assert_eq!(provider.created_names(), vec!["web.example.com"]);
        assert_eq!(provider.record_listings(), 2);
    }
}
