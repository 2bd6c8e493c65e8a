use crate::types::TimerEvent;
use crewflow_scheduler::{Scheduler, TimerHandle};
use std::time::Duration;

/// Time-boxed suppression of repeated reactions.
///
/// The first acquisition opens a window; further acquisitions fail until the
/// `CooldownExpired` timer fires. State changes made during the window still happen,
/// only the downstream reaction is dropped.
#[derive(Debug)]
pub struct CooldownGate {
    window: Duration,
    cooling: bool,
    timer: Option<TimerHandle>,
    suppressed: u64,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            cooling: false,
            timer: None,
            suppressed: 0,
        }
    }

    pub fn is_cooling(&self) -> bool {
        self.cooling
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Returns `true` when a reaction may fire now, and starts the cooldown window.
    pub fn try_acquire(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        if self.cooling {
            self.suppressed += 1;
            tracing::debug!("Reaction suppressed by cooldown ({} so far)", self.suppressed);
            return false;
        }
        self.cooling = true;
        self.timer = Some(timers.schedule(self.window, TimerEvent::CooldownExpired));
        true
    }

    pub fn on_expired(&mut self) {
        self.cooling = false;
        self.timer = None;
    }

    /// Close the window early and drop its pending expiry.
    pub fn reset(&mut self, timers: &mut dyn Scheduler<TimerEvent>) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
        self.cooling = false;
    }
}
