//! Simulated project scan feeding the improvement stage.

use crate::types::TimerEvent;
use crewflow_scheduler::{Scheduler, TimerHandle};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Analyzed,
    Improvable,
    InProgress,
    NeedsDocs,
    SecurityReview,
    Performance,
    TestsPassing,
}

impl FileStatus {
    /// Files the improvement stage should point the user at.
    pub fn needs_work(&self) -> bool {
        matches!(self, FileStatus::Improvable | FileStatus::SecurityReview)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileStatus::Analyzed => "✅ Analyzed",
            FileStatus::Improvable => "⚠️ Improvable",
            FileStatus::InProgress => "🔍 In progress",
            FileStatus::NeedsDocs => "📝 Needs docs",
            FileStatus::SecurityReview => "🔒 Security review",
            FileStatus::Performance => "⚡ Performance",
            FileStatus::TestsPassing => "🧪 Tests OK",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedFile {
    pub name: String,
    pub kind: String,
    pub size: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub total: usize,
    pub improvable: usize,
    pub security_review: usize,
}

fn demo_files() -> Vec<ScannedFile> {
    [
        ("main.py", "Python", "2.3 KB", FileStatus::Analyzed),
        ("app.js", "JavaScript", "5.7 KB", FileStatus::Improvable),
        ("style.css", "CSS", "1.8 KB", FileStatus::Analyzed),
        ("index.html", "HTML", "3.2 KB", FileStatus::InProgress),
        ("config.json", "JSON", "892 B", FileStatus::Analyzed),
        ("utils.py", "Python", "4.1 KB", FileStatus::Improvable),
        ("README.md", "Markdown", "1.5 KB", FileStatus::NeedsDocs),
        ("database.py", "Python", "8.4 KB", FileStatus::SecurityReview),
        ("components.js", "JavaScript", "6.2 KB", FileStatus::Performance),
        ("test_main.py", "Python", "3.8 KB", FileStatus::TestsPassing),
    ]
    .into_iter()
    .map(|(name, kind, size, status)| ScannedFile {
        name: name.to_string(),
        kind: kind.to_string(),
        size: size.to_string(),
        status,
    })
    .collect()
}

#[derive(Debug, Default)]
pub struct ProjectScan {
    files: Vec<ScannedFile>,
    pending: Option<TimerHandle>,
}

impl ProjectScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[ScannedFile] {
        &self.files
    }

    pub fn is_scanning(&self) -> bool {
        self.pending.is_some()
    }

    pub fn needs_work_count(&self) -> usize {
        self.files.iter().filter(|file| file.status.needs_work()).count()
    }

    /// Schedule a scan. A scan already in flight is cancelled and replaced.
    pub fn start(&mut self, delay: Duration, timers: &mut dyn Scheduler<TimerEvent>) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
            tracing::debug!("Replacing in-flight project scan");
        }
        self.pending = Some(timers.schedule(delay, TimerEvent::ScanComplete));
    }

    /// Populate the scanned file list. Returns `None` when no scan was pending.
    pub fn complete(&mut self) -> Option<ScanReport> {
        self.pending.take()?;
        self.files = demo_files();

        let report = ScanReport {
            total: self.files.len(),
            improvable: self
                .files
                .iter()
                .filter(|file| file.status == FileStatus::Improvable)
                .count(),
            security_review: self
                .files
                .iter()
                .filter(|file| file.status == FileStatus::SecurityReview)
                .count(),
        };
        tracing::info!(
            "Project scan complete: {} files, {} improvable, {} for security review",
            report.total,
            report.improvable,
            report.security_review
        );
        Some(report)
    }
}
