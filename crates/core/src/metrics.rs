use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct Metrics {
    recommendations: AtomicU64,
    notifications_replaced: AtomicU64,
    reactions_suppressed: AtomicU64,
    ticks_applied: AtomicU64,
    stale_ticks: AtomicU64,
    action_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_recommendations(&self) {
        self.recommendations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_replaced(&self) {
        self.notifications_replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reactions_suppressed(&self) {
        self.reactions_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ticks_applied(&self) {
        self.ticks_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stale_ticks(&self) {
        self.stale_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_action_failures(&self) {
        self.action_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            recommendations: self.recommendations.load(Ordering::Relaxed),
            notifications_replaced: self.notifications_replaced.load(Ordering::Relaxed),
            reactions_suppressed: self.reactions_suppressed.load(Ordering::Relaxed),
            ticks_applied: self.ticks_applied.load(Ordering::Relaxed),
            stale_ticks: self.stale_ticks.load(Ordering::Relaxed),
            action_failures: self.action_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            recommendations: AtomicU64::new(0),
            notifications_replaced: AtomicU64::new(0),
            reactions_suppressed: AtomicU64::new(0),
            ticks_applied: AtomicU64::new(0),
            stale_ticks: AtomicU64::new(0),
            action_failures: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub recommendations: u64,
    pub notifications_replaced: u64,
    pub reactions_suppressed: u64,
    pub ticks_applied: u64,
    pub stale_ticks: u64,
    pub action_failures: u64,
}

impl MetricsSnapshot {
    /// Share of scheduled ticks that belonged to a live run.
    pub fn tick_hit_rate(&self) -> f64 {
        let total = self.ticks_applied + self.stale_ticks;
        if total == 0 {
            return 1.0;
        }
        self.ticks_applied as f64 / total as f64
    }
}
