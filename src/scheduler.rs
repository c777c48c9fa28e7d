//! Fixed-interval cooperative scheduling
//!
//! Each task tracks its own last run. Polling never waits: a task whose
//! interval has not elapsed is skipped until a later poll.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time since an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock advanced by hand
///
/// Clones share the same time, so a test can keep one handle while the
/// pipeline owns another.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use fusion_link::scheduler::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(10));
/// assert_eq!(clock.now(), Duration::from_millis(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot<T> {
    task: T,
    interval: Duration,
    last_run: Duration,
}

/// Dispatcher over a list of (interval, task) pairs
///
/// Tasks come back from [`Scheduler::due`] in registration order. A task
/// first becomes due one full interval after the scheduler's origin.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    origin: Duration,
    slots: Vec<Slot<T>>,
}

impl<T: Copy> Scheduler<T> {
    /// Measure every interval from `origin`
    pub fn new(origin: Duration) -> Self {
        Self {
            origin,
            slots: Vec::new(),
        }
    }

    /// Register a task to run every `interval`
    pub fn every(mut self, interval: Duration, task: T) -> Self {
        self.slots.push(Slot {
            task,
            interval,
            last_run: self.origin,
        });
        self
    }

    /// Tasks whose interval has elapsed at `now`, marking each as run
    ///
    /// The next interval of a task is measured from `now`, not from when it
    /// was due, so a late poll does not cause a burst of catch-up runs.
    pub fn due(&mut self, now: Duration) -> impl Iterator<Item = T> + '_ {
        self.slots.iter_mut().filter_map(move |slot| {
            if now.saturating_sub(slot.last_run) >= slot.interval {
                slot.last_run = now;
                Some(slot.task)
            } else {
                None
            }
        })
    }

    /// Time from `now` until the earliest task becomes due
    pub fn until_next(&self, now: Duration) -> Duration {
        self.slots
            .iter()
            .map(|slot| (slot.last_run + slot.interval).saturating_sub(now))
            .min()
            .unwrap_or(Duration::ZERO)
    }
}
