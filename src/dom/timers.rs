//! Timers - cancellable timeouts over a virtual clock.
//!
//! The core is single-threaded and event-loop driven, so timers never
//! block: a callback is queued with a due time and fires when the host
//! advances the clock past it. Terminal hosts advance by real elapsed time
//! each tick; tests advance deterministically.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use spark_popup::dom::Timers;
//!
//! let timers = Timers::new();
//! let id = timers.set_timeout(Duration::from_millis(50), || println!("fired"));
//! timers.clear_timeout(id);
//! assert_eq!(timers.advance(Duration::from_millis(100)), 0);
//! ```

use std::cell::{Cell, RefCell};
use std::time::Duration;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Pending {
    id: TimerId,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
pub struct Timers {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    pending: RefCell<Vec<Pending>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.pending.borrow_mut().push(Pending {
            id,
            due: self.now.get() + delay,
            callback: Box::new(callback),
        });
        trace!(?id, ?delay, "timer armed");
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was cleared.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|timer| timer.id != id);
        pending.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.borrow().iter().any(|timer| timer.id == id)
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Move the clock forward, firing due timers in (due, id) order.
    ///
    /// Timers armed by a callback fire within the same call if they fall
    /// due before the target time. Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;

        while let Some(timer) = self.pop_due(target) {
            self.now.set(timer.due);
            trace!(id = ?timer.id, "timer fired");
            (timer.callback)();
            fired += 1;
        }

        self.now.set(target);
        fired
    }

    fn pop_due(&self, target: Duration) -> Option<Pending> {
        let mut pending = self.pending.borrow_mut();
        let index = pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= target)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;
        Some(pending.remove(index))
    }
}
