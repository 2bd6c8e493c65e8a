//! Timed quick actions over scanned files and the modification history they feed.

use crate::error::EngineError;
use crate::scan::ScannedFile;
use crate::types::TimerEvent;
use chrono::{DateTime, Local};
use crewflow_scheduler::{Scheduler, TimerHandle};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickActionKind {
    Comments,
    Security,
    Docstrings,
    Format,
    Bugs,
    Optimize,
    Tests,
    Complexity,
    Refactor,
}

impl QuickActionKind {
    pub const ALL: [QuickActionKind; 9] = [
        QuickActionKind::Comments,
        QuickActionKind::Security,
        QuickActionKind::Docstrings,
        QuickActionKind::Format,
        QuickActionKind::Bugs,
        QuickActionKind::Optimize,
        QuickActionKind::Tests,
        QuickActionKind::Complexity,
        QuickActionKind::Refactor,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            QuickActionKind::Comments => "Adding comments",
            QuickActionKind::Security => "Securing secrets",
            QuickActionKind::Docstrings => "Generating docstrings",
            QuickActionKind::Format => "Formatting code",
            QuickActionKind::Bugs => "Detecting bugs",
            QuickActionKind::Optimize => "Optimizing performance",
            QuickActionKind::Tests => "Generating tests",
            QuickActionKind::Complexity => "Analyzing complexity",
            QuickActionKind::Refactor => "Refactoring",
        }
    }

    /// Outcome line for a run over `file_count` files.
    pub fn result(&self, file_count: usize) -> String {
        match self {
            QuickActionKind::Comments => format!("✅ {} comments added", file_count * 15),
            QuickActionKind::Security => format!("🔒 {} secrets secured", file_count * 3),
            QuickActionKind::Docstrings => format!("📚 {} docstrings generated", file_count * 8),
            QuickActionKind::Format => format!("🎨 {} files formatted", file_count),
            QuickActionKind::Bugs => format!("🐛 {} potential bugs detected", file_count * 2),
            QuickActionKind::Optimize => format!("⚡ {} optimizations suggested", file_count * 5),
            QuickActionKind::Tests => format!("🧪 {} tests generated", file_count * 4),
            QuickActionKind::Complexity => {
                format!("📊 Complexity analyzed for {} files", file_count)
            }
            QuickActionKind::Refactor => {
                format!("🔄 {} refactoring suggestions", file_count * 6)
            }
        }
    }
}

impl fmt::Display for QuickActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuickActionKind::Comments => "comments",
            QuickActionKind::Security => "security",
            QuickActionKind::Docstrings => "docstrings",
            QuickActionKind::Format => "format",
            QuickActionKind::Bugs => "bugs",
            QuickActionKind::Optimize => "optimize",
            QuickActionKind::Tests => "tests",
            QuickActionKind::Complexity => "complexity",
            QuickActionKind::Refactor => "refactor",
        };
        f.write_str(name)
    }
}

impl FromStr for QuickActionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        QuickActionKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == name)
            .ok_or(EngineError::UnknownQuickAction(name))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Modification {
    pub at: DateTime<Local>,
    pub kind: QuickActionKind,
    pub files: Vec<String>,
    pub result: String,
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M"), self.result)
    }
}

#[derive(Debug)]
struct PendingAction {
    handle: TimerHandle,
    kind: QuickActionKind,
    files: Vec<String>,
}

/// At most one quick action in flight; completions are recorded newest first.
#[derive(Debug)]
pub struct QuickActions {
    pending: Option<PendingAction>,
    history: VecDeque<Modification>,
    history_cap: usize,
}

impl QuickActions {
    pub fn new(history_cap: usize) -> Self {
        Self {
            pending: None,
            history: VecDeque::new(),
            history_cap,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Newest first.
    pub fn history(&self) -> impl Iterator<Item = &Modification> {
        self.history.iter()
    }

    /// Schedule `kind` over `files`, which must all be scanned files. Replaces any action
    /// in flight. Returns the number of distinct files.
    pub fn start(
        &mut self,
        kind: QuickActionKind,
        files: &[String],
        scanned: &[ScannedFile],
        delay: Duration,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> Result<usize, EngineError> {
        if files.is_empty() {
            return Err(EngineError::NoFilesSelected);
        }
        let mut selected: Vec<String> = Vec::with_capacity(files.len());
        for name in files {
            if !scanned.iter().any(|file| &file.name == name) {
                return Err(EngineError::UnknownFile(name.clone()));
            }
            if !selected.contains(name) {
                selected.push(name.clone());
            }
        }

        if self.cancel(timers) {
            tracing::debug!("Replacing in-flight quick action");
        }
        let count = selected.len();
        let handle = timers.schedule(delay, TimerEvent::QuickActionComplete);
        self.pending = Some(PendingAction {
            handle,
            kind,
            files: selected,
        });
        tracing::info!("Quick action {} started on {} file(s)", kind, count);
        Ok(count)
    }

    pub fn cancel(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        match self.pending.take() {
            Some(pending) => timers.cancel(pending.handle),
            None => false,
        }
    }

    /// Record the action in flight. Returns `None` when nothing was pending.
    pub fn complete(&mut self) -> Option<Modification> {
        let pending = self.pending.take()?;
        let modification = Modification {
            at: Local::now(),
            kind: pending.kind,
            result: pending.kind.result(pending.files.len()),
            files: pending.files,
        };
        tracing::info!("Quick action {} complete: {}", modification.kind, modification.result);

        self.history.push_front(modification.clone());
        self.history.truncate(self.history_cap);
        Some(modification)
    }
}
