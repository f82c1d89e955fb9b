//! Time sources for timer-driven effects.
//!
//! `Debounced`, `Throttled` and `AfterDelay` never call tokio directly; they
//! sleep through a [`Clock`] so tests can swap in a [`VirtualClock`] and
//! advance time by hand.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Default number of scheduler yields after each fired virtual timer.
pub const DEFAULT_SETTLE_YIELDS: u32 = 8;

/// Substitutable source of time.
///
/// `sleep` must fix its deadline when called, not when first polled: the
/// engine creates the sleep before spawning the task that awaits it.
pub trait Clock: Send + Sync + 'static {
    /// Time elapsed since the clock's epoch.
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Wall-clock time backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct TokioClock {
    epoch: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            epoch: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Manually driven clock for deterministic tests.
///
/// Sleeps only complete when [`VirtualClock::advance`] moves time past their
/// deadline. Timers fire in deadline order, ties in creation order.
#[derive(Clone)]
pub struct VirtualClock {
    timeline: Arc<Mutex<Timeline>>,
    settle_yields: u32,
}

#[derive(Default)]
struct Timeline {
    now: Duration,
    next_seq: u64,
    sleepers: BTreeMap<(Duration, u64), oneshot::Sender<()>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::with_settle_yields(DEFAULT_SETTLE_YIELDS)
    }

    /// `settle_yields` is how many times the caller yields to the scheduler
    /// after each fired timer so woken tasks can make progress.
    pub fn with_settle_yields(settle_yields: u32) -> Self {
        Self {
            timeline: Arc::new(Mutex::new(Timeline::default())),
            settle_yields: settle_yields.max(1),
        }
    }

    /// Number of sleeps still waiting on a deadline.
    pub fn pending_timers(&self) -> usize {
        self.timeline
            .lock()
            .sleepers
            .values()
            .filter(|waker| !waker.is_closed())
            .count()
    }

    /// Move time forward by `by`, firing every timer that falls due.
    ///
    /// Spawned tasks get to run first so sleeps they are about to create are
    /// registered against the current time. Timers registered while
    /// advancing (for example a debounce re-armed by a fired effect) fire too
    /// if their deadline is inside the window.
    pub async fn advance(&self, by: Duration) {
        self.settle().await;
        let target = self.timeline.lock().now + by;
        loop {
            let due = {
                let mut timeline = self.timeline.lock();
                let next = timeline
                    .sleepers
                    .keys()
                    .next()
                    .copied()
                    .filter(|(deadline, _)| *deadline <= target);
                match next {
                    Some(entry) => {
                        timeline.now = timeline.now.max(entry.0);
                        timeline.sleepers.remove(&entry)
                    }
                    None => None,
                }
            };
            let Some(waker) = due else {
                break;
            };
            // Receiver gone means the sleeping task was cancelled.
            let _ = waker.send(());
            self.settle().await;
        }
        self.timeline.lock().now = target;
        self.settle().await;
    }

    /// Yield to the scheduler so tasks woken by the last timer can run.
    pub async fn settle(&self) {
        for _ in 0..self.settle_yields {
            tokio::task::yield_now().await;
        }
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.timeline.lock().now
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        let (waker, fired) = oneshot::channel();
        {
            let mut timeline = self.timeline.lock();
            let deadline = timeline.now + duration;
            let seq = timeline.next_seq;
            timeline.next_seq += 1;
            timeline.sleepers.insert((deadline, seq), waker);
        }
        Box::pin(async move {
            if fired.await.is_err() {
                // Clock dropped: this deadline can never be reached.
                futures::future::pending::<()>().await;
            }
        })
    }
}
