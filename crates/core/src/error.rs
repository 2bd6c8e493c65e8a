use crate::types::CrewId;
use crewflow_scheduler::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("An analysis run is already in progress")]
    AlreadyRunning,

    #[error("Cannot {operation} while the analysis is {from}")]
    InvalidTransition {
        from: &'static str,
        operation: &'static str,
    },

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Unknown crew: {0}")]
    UnknownCrew(String),

    #[error("Unknown agent '{agent}' in crew {crew}")]
    UnknownAgent { crew: CrewId, agent: String },

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Crew {0} has no agents")]
    EmptyCrew(CrewId),

    #[error("Crew {0} is defined twice")]
    DuplicateCrew(CrewId),

    #[error("Unknown quick action: {0}")]
    UnknownQuickAction(String),

    #[error("No scanned file named {0}")]
    UnknownFile(String),

    #[error("Select at least one file")]
    NoFilesSelected,

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
