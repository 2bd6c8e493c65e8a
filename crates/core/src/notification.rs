//! Single-slot notification display with auto-dismiss and contained action execution.

use crate::config::NotificationConfig;
use crate::error::EngineError;
use crate::types::{Priority, Recommendation, RecommendationAction, RecommendedAction, TimerEvent};
use crewflow_scheduler::{Scheduler, TimerHandle};
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Advice(Priority),
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub action: Option<RecommendedAction>,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            action: None,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
            action: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: RecommendedAction) -> Self {
        self.action = Some(action);
        self
    }
}

impl From<Recommendation> for Notice {
    fn from(rec: Recommendation) -> Self {
        Self {
            level: NoticeLevel::Advice(rec.priority),
            text: format!("{} {}: {}", rec.priority.icon(), rec.title, rec.message),
            action: rec.action,
        }
    }
}

/// Interprets recommendation actions on behalf of the controller.
pub trait ActionHandler {
    /// Carry out `action`. A returned notice is shown as a short confirmation.
    fn perform(
        &mut self,
        action: &RecommendationAction,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> Result<Option<Notice>, EngineError>;
}

#[derive(Debug)]
pub enum ActionOutcome {
    /// Nothing was shown, or the visible notice carried no action.
    NoAction,
    Completed(RecommendationAction),
    Failed {
        action: RecommendationAction,
        error: EngineError,
    },
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "action panicked".to_string()
    }
}

pub struct NotificationController {
    config: NotificationConfig,
    slot: Option<Notice>,
    timer: Option<TimerHandle>,
    generation: u64,
}

impl NotificationController {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            slot: None,
            timer: None,
            generation: 0,
        }
    }

    pub fn current(&self) -> Option<&Notice> {
        self.slot.as_ref()
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show with the default lifetime.
    pub fn notify(&mut self, notice: Notice, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        self.show(notice, self.config.duration(), timers)
    }

    /// Replace whatever is visible. A zero `duration` keeps the notice until hidden.
    /// Returns `true` when an earlier notice was replaced.
    pub fn show(
        &mut self,
        notice: Notice,
        duration: Duration,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> bool {
        let replaced = self.hide(timers);
        self.generation += 1;

        if !duration.is_zero() {
            self.timer = Some(timers.schedule(
                duration,
                TimerEvent::DismissNotice {
                    generation: self.generation,
                },
            ));
        }
        tracing::debug!("Showing notice #{}: {}", self.generation, notice.text);
        self.slot = Some(notice);
        replaced
    }

    /// Idempotent. Returns `true` if something was visible.
    pub fn hide(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
        self.slot.take().is_some()
    }

    /// Auto-dismiss callback. Ignored unless it belongs to the notice still on display.
    pub fn on_dismiss(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.slot.is_none() {
            tracing::debug!("Ignoring dismiss for replaced notice #{}", generation);
            return false;
        }
        self.timer = None;
        self.slot = None;
        true
    }

    /// Hide the current notice, then run its action. Failures and panics inside the
    /// handler are reported as an error notice and never escape.
    pub fn execute_action(
        &mut self,
        timers: &mut dyn Scheduler<TimerEvent>,
        handler: &mut dyn ActionHandler,
    ) -> ActionOutcome {
        let action = self.slot.as_ref().and_then(|notice| notice.action.clone());
        self.hide(timers);
        let Some(action) = action else {
            return ActionOutcome::NoAction;
        };

        let result = catch_unwind(AssertUnwindSafe(|| handler.perform(&action.command, &mut *timers)));
        let error = match result {
            Ok(Ok(confirmation)) => {
                if let Some(confirmation) = confirmation {
                    self.show(confirmation, self.config.confirmation(), timers);
                }
                return ActionOutcome::Completed(action.command);
            }
            Ok(Err(error)) => error,
            Err(payload) => EngineError::ActionFailed(panic_message(payload.as_ref())),
        };

        tracing::warn!("Action '{}' failed: {}", action.label, error);
        self.notify(
            Notice::error(format!("❌ Action '{}' failed: {}", action.label, error)),
            timers,
        );
        ActionOutcome::Failed {
            action: action.command,
            error,
        }
    }
}
