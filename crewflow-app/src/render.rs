//! Terminal rendering of shell events.

use crate::config::EventFormat;
use crewflow_core::{NoticeLevel, Priority, SessionSummary, Shell, ShellEvent};

const UI_RESET: &str = "\x1b[0m";
const UI_BOLD: &str = "\x1b[1m";
const UI_DIM: &str = "\x1b[2m";
const UI_ACCENT: &str = "\x1b[38;5;39m";
const UI_INFO: &str = "\x1b[38;5;81m";
const UI_SUCCESS: &str = "\x1b[38;5;42m";
const UI_WARN: &str = "\x1b[38;5;214m";
const UI_DANGER: &str = "\x1b[38;5;203m";

fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, style: &str) -> String {
    if use_color() {
        format!("{style}{text}{UI_RESET}")
    } else {
        text.to_string()
    }
}

fn ui_title(text: &str) -> String {
    paint(text, UI_BOLD)
}

fn ui_dim(text: &str) -> String {
    paint(text, UI_DIM)
}

fn ui_accent(text: &str) -> String {
    paint(text, UI_ACCENT)
}

fn ui_info(text: &str) -> String {
    paint(text, UI_INFO)
}

fn ui_success(text: &str) -> String {
    paint(text, UI_SUCCESS)
}

fn ui_warn(text: &str) -> String {
    paint(text, UI_WARN)
}

fn ui_danger(text: &str) -> String {
    paint(text, UI_DANGER)
}

pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width + 50) / 100;
    let filled = filled.min(width);
    let mut bar = String::new();
    bar.push('[');
    bar.push_str(&"█".repeat(filled));
    bar.push_str(&"░".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

/// `None` for events with nothing to print.
pub fn render_event(shell: &Shell, event: &ShellEvent, format: EventFormat) -> Option<String> {
    if format == EventFormat::Json {
        return Some(serde_json::to_string(event).unwrap_or_else(|e| {
            serde_json::json!({ "event": "error", "message": e.to_string() }).to_string()
        }));
    }

    let text = match event {
        ShellEvent::NoticeShown { notice } => {
            let styled = match notice.level {
                NoticeLevel::Error => ui_danger(&notice.text),
                NoticeLevel::Success => ui_success(&notice.text),
                NoticeLevel::Advice(Priority::High) => ui_warn(&notice.text),
                NoticeLevel::Advice(_) => ui_info(&notice.text),
                NoticeLevel::Info => ui_accent(&notice.text),
            };
            match &notice.action {
                Some(action) => format!(
                    "{}\n  {}",
                    styled,
                    ui_dim(&format!("↳ type 'action' to run: {}", action.label))
                ),
                None => styled,
            }
        }
        ShellEvent::NoticeCleared => return None,
        ShellEvent::Assistant { text } => format!("🤖 {}", text),
        ShellEvent::StageChanged { previous, current } => {
            ui_dim(&format!("── stage: {} → {}", previous, current))
        }
        ShellEvent::Progress { value, label, .. } => {
            format!("{} {:>3}%  {}", progress_bar(*value, 30), value, ui_dim(label))
        }
        ShellEvent::AnalysisComplete { summary } => {
            let mut lines = vec![ui_title(&format!("Analysis run {} results", summary.run))];
            for (metric, value) in shell.progress().state().metrics() {
                lines.push(format!("  {:<20}: {}", metric.label(), value));
            }
            lines.push(format!("  {}", ui_accent("Generated files")));
            for artifact in shell.progress().artifacts() {
                lines.push(format!("    {} {}", artifact.path, ui_dim(&format!("({})", artifact.crew))));
            }
            lines.join("\n")
        }
        ShellEvent::LanguagesDetected { languages } => {
            format!("🔍 Languages: {}", languages.join(", "))
        }
        ShellEvent::ScanComplete { .. } => {
            let mut lines = vec![ui_title("Project files")];
            for file in shell.scanned_files() {
                lines.push(format!(
                    "  {:<16} {:<11} {:>7}  {}",
                    file.name, file.kind, file.size, file.status
                ));
            }
            lines.join("\n")
        }
        ShellEvent::QuickActionComplete { .. } => {
            let mut lines = vec![ui_title("Modification history")];
            for modification in shell.modifications() {
                lines.push(format!(
                    "  {} {}",
                    modification,
                    ui_dim(&format!("({})", modification.files.join(", ")))
                ));
            }
            lines.join("\n")
        }
        ShellEvent::Summary { summary } => render_summary(summary),
        ShellEvent::Error { message } => ui_danger(&format!("❌ {}", message)),
    };
    Some(text)
}

fn render_summary(summary: &SessionSummary) -> String {
    let recent = if summary.recent_recommendations.is_empty() {
        "none".to_string()
    } else {
        summary.recent_recommendations.join(" | ")
    };
    [
        ui_title("Session Status"),
        format!("  Stage        : {}", ui_info(&summary.stage.to_string())),
        format!("  Progress     : {} {}%", progress_bar(summary.progress, 20), summary.progress),
        format!("  Crews/Langs  : {} / {}", summary.crews, summary.languages),
        format!("  Complexity   : {:.1}", summary.complexity_score),
        format!("  Actions      : {} ({} questions asked)", summary.actions, summary.questions_asked),
        format!("  Duration     : {}s", summary.session_secs),
        format!("  Recent       : {}", ui_dim(&recent)),
        format!(
            "  Metrics      : {} recommendations, {} replaced, {} suppressed, {} failed actions",
            summary.metrics.recommendations,
            summary.metrics.notifications_replaced,
            summary.metrics.reactions_suppressed,
            summary.metrics.action_failures
        ),
        format!("  Tick hit rate: {:.0}%", summary.metrics.tick_hit_rate() * 100.0),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewflow_core::{Catalog, Command, EngineConfig, Notice, QuickActionKind};

    fn shell() -> Shell {
        let config = EngineConfig {
            seed: Some(1),
            ..EngineConfig::default()
        };
        Shell::new(config, Catalog::default()).unwrap()
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 4), "[░░░░]");
        assert_eq!(progress_bar(50, 4), "[██░░]");
        assert_eq!(progress_bar(100, 4), "[████]");
    }

    #[test]
    fn test_json_events() {
        let shell = shell();
        let event = ShellEvent::NoticeShown {
            notice: Notice::info("hello"),
        };
        let line = render_event(&shell, &event, EventFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "notice_shown");
        assert_eq!(value["notice"]["text"], "hello");
        assert!(render_event(&shell, &ShellEvent::NoticeCleared, EventFormat::Text).is_none());
    }

    #[test]
    fn test_scan_table_lists_files() {
        let mut shell = shell();
        shell.apply(Command::ScanProject).unwrap();
        shell.advance(std::time::Duration::from_secs(1));
        let report = shell
            .drain_events()
            .into_iter()
            .find(|event| matches!(event, ShellEvent::ScanComplete { .. }))
            .unwrap();

        let text = render_event(&shell, &report, EventFormat::Text).unwrap();
        assert_eq!(text.lines().count(), 11);
        assert!(text.contains("database.py"));
    }

    #[test]
    fn test_modification_history_lists_newest_first() {
        let mut shell = shell();
        shell.apply(Command::ScanProject).unwrap();
        shell.advance(std::time::Duration::from_secs(1));
        for kind in [QuickActionKind::Format, QuickActionKind::Tests] {
            shell
                .apply(Command::QuickAction {
                    kind,
                    files: vec!["main.py".to_string()],
                })
                .unwrap();
            shell.advance(std::time::Duration::from_millis(1500));
        }
        let done = shell
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, ShellEvent::QuickActionComplete { .. }))
            .last()
            .unwrap();

        let text = render_event(&shell, &done, EventFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("🧪 4 tests generated"));
        assert!(lines[2].contains("🎨 1 files formatted"));
    }
}
