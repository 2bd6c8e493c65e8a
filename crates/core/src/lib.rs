pub mod catalog;
pub mod config;
pub mod context;
pub mod cooldown;
pub mod dialogue;
pub mod error;
pub mod metrics;
pub mod notification;
pub mod progress;
pub mod quick_action;
pub mod recommendation;
pub mod runtime;
pub mod scan;
pub mod selection;
pub mod shell;
pub mod types;

pub use catalog::{load_crew_catalog, AgentDefinition, Catalog, CrewDefinition};
pub use config::EngineConfig;
pub use context::SessionContext;
pub use cooldown::CooldownGate;
pub use dialogue::{DialogueResponder, QuestionId, Reply};
pub use error::EngineError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use notification::{ActionHandler, ActionOutcome, Notice, NoticeLevel, NotificationController};
pub use progress::{AnalysisPlan, ProgressSimulator, ProgressState, RunStatus, RunSummary, TickOutcome};
pub use quick_action::{Modification, QuickActionKind, QuickActions};
pub use recommendation::{Observation, RecommendationEngine};
pub use runtime::run_session;
pub use scan::{FileStatus, ProjectScan, ScanReport, ScannedFile};
pub use selection::SelectionModel;
pub use shell::{Command, SessionSummary, Shell, ShellEvent};
pub use types::*;
