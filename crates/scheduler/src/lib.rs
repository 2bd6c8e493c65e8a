//! Deferred-callback scheduling on a virtual millisecond clock.
//!
//! Timers carry typed events instead of closures. The owner drains due events with
//! [`TimerQueue::pop_due`] and dispatches them itself, so every callback runs on the
//! owner's thread and can be cancelled through its [`TimerHandle`].

pub mod clock;

pub use clock::{Clock, TokioClock};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Repeating timer interval must be non-zero")]
    ZeroInterval,
}

/// Cancellable reference to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// "Run after N ms" and "run every N ms until cancelled".
pub trait Scheduler<E: Clone> {
    /// Current position of the scheduler clock, measured from its origin.
    fn now(&self) -> Duration;

    fn schedule(&mut self, delay: Duration, event: E) -> TimerHandle;

    fn schedule_every(&mut self, interval: Duration, event: E)
        -> Result<TimerHandle, SchedulerError>;

    /// Returns `false` when the timer already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    fn is_pending(&self, handle: TimerHandle) -> bool;
}

struct Entry<E> {
    handle: TimerHandle,
    event: E,
    interval: Option<Duration>,
}

/// Ordered by `(deadline, sequence)`; equal deadlines fire in scheduling order, but
/// callers must not rely on that.
type Slot = (Duration, u64);

pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BTreeMap<Slot, Entry<E>>,
    index: HashMap<TimerHandle, Slot>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to its deadline.
    /// Repeating timers are re-armed under the same handle before the event is returned.
    pub fn pop_due(&mut self, until: Duration) -> Option<E>
    where
        E: Clone,
    {
        let slot = *self.queue.keys().next()?;
        if slot.0 > until {
            return None;
        }
        let entry = self.queue.remove(&slot)?;
        self.index.remove(&entry.handle);
        self.now = self.now.max(slot.0);

        match entry.interval {
            Some(interval) => {
                let event = entry.event.clone();
                self.insert(entry.handle, self.now + interval, entry.event, Some(interval));
                Some(event)
            }
            None => Some(entry.event),
        }
    }

    /// Moves the clock forward without firing anything. Call after draining `pop_due`.
    pub fn advance_clock(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn allocate(&mut self) -> TimerHandle {
        self.next_id += 1;
        TimerHandle(self.next_id)
    }

    fn insert(&mut self, handle: TimerHandle, deadline: Duration, event: E, interval: Option<Duration>) {
        self.next_seq += 1;
        let slot = (deadline, self.next_seq);
        self.queue.insert(
            slot,
            Entry {
                handle,
                event,
                interval,
            },
        );
        self.index.insert(handle, slot);
    }
}

impl<E: Clone> Scheduler<E> for TimerQueue<E> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, event: E) -> TimerHandle {
        let handle = self.allocate();
        self.insert(handle, self.now + delay, event, None);
        handle
    }

    fn schedule_every(
        &mut self,
        interval: Duration,
        event: E,
    ) -> Result<TimerHandle, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        let handle = self.allocate();
        self.insert(handle, self.now + interval, event, Some(interval));
        Ok(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.index.remove(&handle) {
            Some(slot) => {
                self.queue.remove(&slot);
                tracing::trace!("Cancelled timer {}", handle.id());
                true
            }
            None => false,
        }
    }

    fn is_pending(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(event) = queue.pop_due(until) {
            fired.push(event);
        }
        queue.advance_clock(until);
        fired
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(300), "late");
        queue.schedule(ms(100), "early");
        queue.schedule(ms(200), "middle");

        assert_eq!(drain(&mut queue, ms(1000)), vec!["early", "middle", "late"]);
        assert_eq!(queue.now(), ms(1000));
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_not_due_yet() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(500), "tick");

        assert!(drain(&mut queue, ms(499)).is_empty());
        assert!(queue.is_pending(handle));
        assert_eq!(drain(&mut queue, ms(500)), vec!["tick"]);
        assert!(!queue.is_pending(handle));
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let first = queue.schedule(ms(100), "first");
        queue.schedule(ms(100), "second");

        assert!(queue.cancel(first));
        assert!(!queue.cancel(first));
        assert_eq!(drain(&mut queue, ms(200)), vec!["second"]);
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut queue = TimerQueue::new();
        queue.advance_clock(ms(1000));
        queue.schedule(ms(50), "relative");

        assert_eq!(queue.next_deadline(), Some(ms(1050)));
    }

    #[test]
    fn test_repeating_until_cancelled() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_every(ms(100), "refresh").unwrap();

        assert_eq!(drain(&mut queue, ms(350)), vec!["refresh"; 3]);
        assert!(queue.is_pending(handle));

        assert!(queue.cancel(handle));
        assert!(drain(&mut queue, ms(1000)).is_empty());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut queue: TimerQueue<&str> = TimerQueue::new();
        assert_eq!(
            queue.schedule_every(Duration::ZERO, "spin"),
            Err(SchedulerError::ZeroInterval)
        );
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut queue: TimerQueue<&str> = TimerQueue::new();
        queue.advance_clock(ms(500));
        queue.advance_clock(ms(100));
        assert_eq!(queue.now(), ms(500));
    }
}
