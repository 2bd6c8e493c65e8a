//! Shared value types for the workflow shell.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow phase. Every stage is reachable from every other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configuration,
    Results,
    Improvement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Results => "results",
            Stage::Improvement => "improvement",
        };
        f.write_str(name)
    }
}

impl FromStr for Stage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "configuration" | "config" => Ok(Stage::Configuration),
            "results" => Ok(Stage::Results),
            "improvement" | "improve" => Ok(Stage::Improvement),
            other => Err(EngineError::UnknownStage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewId {
    Documentation,
    CodeImprovement,
    Security,
    SocialContent,
}

impl CrewId {
    pub const ALL: [CrewId; 4] = [
        CrewId::Documentation,
        CrewId::CodeImprovement,
        CrewId::Security,
        CrewId::SocialContent,
    ];
}

impl fmt::Display for CrewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrewId::Documentation => "documentation",
            CrewId::CodeImprovement => "code_improvement",
            CrewId::Security => "security",
            CrewId::SocialContent => "social_content",
        };
        f.write_str(name)
    }
}

impl FromStr for CrewId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "documentation" | "docs" => Ok(CrewId::Documentation),
            "code_improvement" | "improvement" | "code" => Ok(CrewId::CodeImprovement),
            "security" => Ok(CrewId::Security),
            "social_content" | "social" => Ok(CrewId::SocialContent),
            other => Err(EngineError::UnknownCrew(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn icon(&self) -> &'static str {
        match self {
            Priority::High => "⚠️",
            Priority::Medium => "💡",
            Priority::Low => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    WorkflowGuidance,
    CrossReference,
    ActionNeeded,
    SecurityAdvice,
    ImprovementAdvice,
    ComplexityWarning,
    Engagement,
}

/// Which agents of a crew an activation shortcut switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentSpan {
    All,
    First(usize),
}

/// Command attached to a recommendation. Interpreted by the shell, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationAction {
    GoToStage { stage: Stage },
    StartAnalysis,
    ActivateCrew { crew: CrewId, agents: AgentSpan },
    ScanProject,
    StartAutoDemo,
    RevealCrews,
    RevealQuickActions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub label: String,
    pub command: RecommendationAction,
}

impl RecommendedAction {
    pub fn new(label: impl Into<String>, command: RecommendationAction) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub action: Option<RecommendedAction>,
}

/// Events carried by the shell's timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    ProgressTick { run: u64 },
    CooldownExpired,
    CrewReaction { crew: CrewId },
    DismissNotice { generation: u64 },
    ScanComplete,
    QuickActionComplete,
    AutoDemoStep(u8),
    SummaryRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    FilesAnalyzed,
    LinesOfCode,
    LanguagesDetected,
    ActiveAgents,
    GeneratedFiles,
    AnalysisTime,
}

impl MetricId {
    pub fn label(&self) -> &'static str {
        match self {
            MetricId::FilesAnalyzed => "Files analyzed",
            MetricId::LinesOfCode => "Lines of code",
            MetricId::LanguagesDetected => "Languages detected",
            MetricId::ActiveAgents => "Active agents",
            MetricId::GeneratedFiles => "Generated files",
            MetricId::AnalysisTime => "Analysis time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(u64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(text) => f.write_str(text),
        }
    }
}
