//! Delayed growth transitions shared by every farm on the server.
//!
//! A pending timer is a sleeping tokio task and costs no worker while it
//! waits. When it fires it must take one of a fixed number of worker permits
//! before touching the engine, which bounds how many ripen callbacks run at
//! the same time regardless of how many players are online.

use crate::engine::PlotEngine;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct GrowthScheduler {
    runtime: Handle,
    workers: Arc<Semaphore>,
    growth_delay: Duration,
    pending: Arc<AtomicUsize>,
}

impl GrowthScheduler {
    /// Creates a scheduler that spawns its timers on `runtime`.
    ///
    /// `workers` is clamped to at least one so a misconfigured pool can
    /// never stall every timer forever.
    pub fn new(runtime: Handle, workers: usize, growth_delay: Duration) -> Self {
        Self {
            runtime,
            workers: Arc::new(Semaphore::new(workers.max(1))),
            growth_delay,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay applied to every crop planted through this scheduler.
    pub fn growth_delay(&self) -> Duration {
        self.growth_delay
    }

    /// Number of timers that have been scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Schedules one ripen attempt for `(row, col)` of `engine`.
    ///
    /// The callback runs no earlier than `delay` from now and at most once.
    /// `cycle` identifies the growth cycle that was planted; the engine
    /// ignores the callback if the plot has moved on since.
    pub fn schedule_ripen(
        &self,
        engine: Arc<PlotEngine>,
        row: usize,
        col: usize,
        cycle: u64,
        delay: Duration,
    ) {
        let workers = Arc::clone(&self.workers);
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            // The semaphore is never closed, so this only fails on shutdown.
            let permit = workers.acquire_owned().await;
            pending.fetch_sub(1, Ordering::SeqCst);
            if permit.is_ok() {
                let ripened = engine.ripen(row, col, cycle);
                debug!(
                    "Growth timer for plot {},{} (cycle {}) fired, ripened: {}",
                    row, col, cycle, ripened
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlotState;

    #[tokio::test]
    async fn test_zero_workers_is_clamped() {
        let scheduler = GrowthScheduler::new(Handle::current(), 0, Duration::from_millis(10));
        assert_eq!(scheduler.workers.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_timer_fires_after_delay() {
        let scheduler = GrowthScheduler::new(Handle::current(), 4, Duration::from_millis(80));
        let engine = Arc::new(PlotEngine::new(scheduler.clone()));

        engine.plant(0, 0).unwrap();
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.state(0, 0).unwrap(), PlotState::Growing);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.state(0, 0).unwrap(), PlotState::Ripe);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_many_pending_timers_with_one_worker() {
        let scheduler = GrowthScheduler::new(Handle::current(), 1, Duration::from_millis(30));
        let engine = Arc::new(PlotEngine::new(scheduler.clone()));

        for col in 0..4 {
            engine.plant(0, col).unwrap();
        }
        assert_eq!(scheduler.pending(), 4);

        tokio::time::sleep(Duration::from_millis(250)).await;
        for col in 0..4 {
            assert_eq!(engine.state(0, col).unwrap(), PlotState::Ripe);
        }
        assert_eq!(scheduler.workers.available_permits(), 1);
    }
}
