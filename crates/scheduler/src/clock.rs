use std::time::Duration;
use tokio::time::Instant;

/// Source of "time since session origin" for driving a [`crate::TimerQueue`].
pub trait Clock {
    fn elapsed(&self) -> Duration;

    /// Wall-clock instant at which `offset` (measured from the origin) is reached.
    fn instant_at(&self, offset: Duration) -> Instant;
}

/// Clock backed by tokio's time source, so paused-time tests advance it deterministically.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for TokioClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn instant_at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }
}
