#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use asyncflow::{TaskFuture, Timer, timing::Sleep};

/// One unit of virtual time.
pub const UNIT: Duration = Duration::from_millis(10);

pub fn units(n: u64) -> Duration {
    UNIT * n as u32
}

/// Timer driven by tokio's clock, so tests can run on paused virtual time.
#[derive(Clone, Copy)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Tracks how many tasks are in flight and how many have finished.
#[derive(Default)]
pub struct Gauge {
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl Gauge {
    pub fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

/// A task that reports `outcome` after `delay` units of tokio time, recording
/// itself on `gauge` while it runs.
pub fn timed<T, E>(
    outcome: Result<T, E>,
    delay: u64,
    gauge: &Arc<Gauge>,
) -> impl FnOnce() -> TaskFuture<T, E> + Send + 'static
where
    T: Send + 'static,
    E: Send + 'static,
{
    let gauge = Arc::clone(gauge);
    move || {
        gauge.enter();
        Box::pin(async move {
            tokio::time::sleep(units(delay)).await;
            gauge.leave();
            outcome
        }) as TaskFuture<T, E>
    }
}
