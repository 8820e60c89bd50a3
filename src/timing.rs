//! Timers used to delay asynchronous work.
//!
//! The crate is not tied to any async runtime, so delays go through the
//! [`Timer`] trait. [`ThreadTimer`] works everywhere: every pending delay is
//! registered with one shared background thread that sleeps until the earliest
//! deadline and wakes whichever delays are due. Runtime-specific timers
//! (`tokio::time::sleep`, `smol::Timer`, ...) can be plugged in by implementing
//! [`Timer`] for a small adapter type.

use std::{
    cmp::{Ordering as CmpOrdering, Reverse},
    collections::BinaryHeap,
    pin::Pin,
    sync::{
        Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    time::{Duration, Instant},
};

use futures::task::AtomicWaker;

static TIMER_THREAD: OnceLock<Option<Arc<Wheel>>> = OnceLock::new();

/// A boxed future that completes once a delay has elapsed.
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Source of delays for [`AsyncFn`](crate::adapter::AsyncFn).
///
/// The only contract is that the returned future completes no earlier than
/// `duration` after `sleep` was called, and that it eventually completes.
pub trait Timer: Send + Sync + 'static {
    /// Returns a future that completes after `duration`, measured from this call.
    fn sleep(&self, duration: Duration) -> Sleep;
}

/// Executor agnostic timer backed by a shared timer thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTimer;

impl Timer for ThreadTimer {
    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(Delay::new(duration))
    }
}

struct Alarm {
    rung: AtomicBool,
    waker: AtomicWaker,
}

impl Alarm {
    fn ring(&self) {
        self.rung.store(true, Ordering::Release);
        self.waker.wake();
    }
}

struct Entry {
    due: Instant,
    alarm: Arc<Alarm>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.due.cmp(&other.due)
    }
}

// Pending deadlines shared with the timer thread, earliest first.
struct Wheel {
    pending: Mutex<BinaryHeap<Reverse<Entry>>>,
    changed: Condvar,
}

impl Wheel {
    fn lock(&self) -> MutexGuard<'_, BinaryHeap<Reverse<Entry>>> {
        // Alarms hold no invariants a panic could break.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule(&self, due: Instant, alarm: Arc<Alarm>) {
        let mut pending = self.lock();
        let earliest = pending.peek().is_none_or(|Reverse(first)| due < first.due);
        pending.push(Reverse(Entry { due, alarm }));
        drop(pending);
        if earliest {
            self.changed.notify_one();
        }
    }

    fn run(&self) {
        let mut pending = self.lock();
        loop {
            let now = Instant::now();
            while pending
                .peek()
                .is_some_and(|Reverse(first)| first.due <= now)
            {
                if let Some(Reverse(entry)) = pending.pop() {
                    entry.alarm.ring();
                }
            }

            pending = match pending.peek() {
                Some(Reverse(first)) => {
                    let wait = first.due.saturating_duration_since(now);
                    self.changed
                        .wait_timeout(pending, wait)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .changed
                    .wait(pending)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

/// A future that becomes ready once its deadline has passed.
///
/// The deadline is fixed when the `Delay` is created. On the first pending poll
/// the deadline is registered with the shared timer thread, which wakes the
/// most recently registered waker once it passes.
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Delay {
    due: Instant,
    alarm: Option<Arc<Alarm>>,
}

impl Delay {
    /// Creates a `Delay` that completes `duration` from now.
    pub fn new(duration: Duration) -> Self {
        Self {
            due: Instant::now() + duration,
            alarm: None,
        }
    }

    /// Returns the instant at which this delay completes.
    pub fn deadline(&self) -> Instant {
        self.due
    }

    fn arm(&mut self, cx: &mut Context<'_>) {
        let alarm = Arc::new(Alarm {
            rung: AtomicBool::new(false),
            waker: AtomicWaker::new(),
        });
        alarm.waker.register(cx.waker());

        match timer_thread() {
            Some(wheel) => wheel.schedule(self.due, Arc::clone(&alarm)),
            None => {
                let due = self.due;
                let ringer = Arc::clone(&alarm);
                let spawned = std::thread::Builder::new()
                    .name("asyncflow-delay".into())
                    .spawn(move || {
                        std::thread::sleep(due.saturating_duration_since(Instant::now()));
                        ringer.ring();
                    });
                if let Err(e) = spawned {
                    // Leave the delay unarmed so the next poll tries again.
                    tracing::error!("failed to spawn delay thread: {e}");
                    cx.waker().wake_by_ref();
                    return;
                }
            }
        }
        self.alarm = Some(alarm);
    }
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if Instant::now() >= this.due {
            return Poll::Ready(());
        }
        match &this.alarm {
            Some(alarm) => {
                alarm.waker.register(cx.waker());
                if alarm.rung.load(Ordering::Acquire) {
                    return Poll::Ready(());
                }
            }
            None => this.arm(cx),
        }
        Poll::Pending
    }
}

fn timer_thread() -> Option<&'static Wheel> {
    TIMER_THREAD
        .get_or_init(|| {
            let wheel = Arc::new(Wheel {
                pending: Mutex::new(BinaryHeap::new()),
                changed: Condvar::new(),
            });
            let runner = Arc::clone(&wheel);
            std::thread::Builder::new()
                .name("asyncflow-timer".into())
                .spawn(move || runner.run())
                .inspect_err(|e| {
                    tracing::warn!("timer thread unavailable, using a thread per delay: {e}")
                })
                .ok()
                .map(|_| wheel)
        })
        .as_deref()
}
