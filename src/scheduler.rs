// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Periodic driver for reconciliation passes.
//!
//! The first pass starts immediately, then one pass per interval. Passes never
//! overlap: a tick that comes due while a pass is running fires as soon as that
//! pass returns. A failed pass is logged and the loop keeps going.
//!
//! Shutdown is only observed between passes, so an in-flight pass always
//! finishes before the loop returns.

use crate::context::Context;
use crate::reconciler::{reconcile_once, PassOutcome};
use crate::sync_errors::SyncError;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Run `pass` every `period` until `shutdown` completes.
///
/// Returns the number of passes that ran.
pub async fn run_loop<F, Fut, S>(period: Duration, shutdown: S, mut pass: F) -> u64
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PassOutcome, SyncError>>,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = std::pin::pin!(shutdown);

    let mut passes: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(passes = passes, "Shutdown requested, stopping reconciliation loop");
                break;
            }
            _ = ticker.tick() => {}
        }

        passes += 1;
        debug!(pass = passes, "Starting reconciliation pass");
        match pass().await {
            Ok(outcome) => {
                debug!(pass = passes, outcome = ?outcome, "Reconciliation pass finished");
            }
            Err(e) => {
                error!(
                    pass = passes,
                    stage = e.stage(),
                    transient = e.is_transient(),
                    "Reconciliation pass failed: {}",
                    e
                );
            }
        }
    }

    passes
}

/// Reconcile `ctx` on its configured interval until `shutdown` completes.
pub async fn run<S>(ctx: &Context, shutdown: S) -> u64
where
    S: Future<Output = ()>,
{
    let period = ctx.config.reconcile_interval;
    info!(
        cluster_domain = %ctx.config.cluster_domain,
        interval_secs = period.as_secs(),
        "Starting reconciliation loop"
    );
    run_loop(period, shutdown, move || reconcile_once(ctx)).await
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
