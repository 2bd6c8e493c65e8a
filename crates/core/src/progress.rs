//! Simulated analysis run: randomized progress ticks, step tracking and metric
//! interpolation toward a precomputed plan.

use crate::config::ProgressConfig;
use crate::error::EngineError;
use crate::selection::SelectionModel;
use crate::types::{CrewId, MetricId, MetricValue, TimerEvent};
use crewflow_scheduler::{Scheduler, TimerHandle};
use rand::{Rng, RngCore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Complete,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Active,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: String,
    pub crew: CrewId,
}

impl Artifact {
    fn new(path: &str, crew: CrewId) -> Self {
        Self {
            path: path.to_string(),
            crew,
        }
    }
}

/// Final values a run converges to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisPlan {
    pub metrics: BTreeMap<MetricId, u64>,
    pub total_time_secs: u64,
    pub artifacts: Vec<Artifact>,
}

fn lines_weight(language: &str) -> u64 {
    match language {
        "Python" => 150,
        "JavaScript" => 120,
        "Java" => 200,
        "C++" => 180,
        _ => 100,
    }
}

impl AnalysisPlan {
    /// Synthesize plausible final metrics from the current selection. Nothing is read
    /// from disk; counts come from the selection plus random jitter.
    pub fn generate(selection: &SelectionModel, rng: &mut dyn RngCore) -> Self {
        let languages = selection.active_languages();
        let crews = selection.active_crews();

        let files_analyzed = rng.gen_range(15..=45) + languages.len() as u64 * 3;

        let mut lines_of_code: u64 = languages
            .iter()
            .map(|language| rng.gen_range(50..=300) * lines_weight(language) / 100)
            .sum();
        if lines_of_code == 0 {
            lines_of_code = rng.gen_range(500..=2000);
        }

        let languages_detected = if languages.is_empty() {
            rng.gen_range(2..=4)
        } else {
            languages.len() as u64
        };

        let generated_files = crews.len() as u64 * 3 + rng.gen_range(2..=6);
        let total_time_secs = rng.gen_range(15..=45);

        let mut artifacts = vec![
            Artifact::new("README.md", CrewId::Documentation),
            Artifact::new(".gitignore", CrewId::Security),
            Artifact::new("SECURITY.md", CrewId::Security),
        ];
        for summary in &crews {
            let files: [&str; 2] = match summary.crew {
                CrewId::Documentation => ["docs/API.md", "docs/INSTALL.md"],
                CrewId::Security => [".env.example", "docker-compose.yml"],
                CrewId::SocialContent => ["SOCIAL_POSTS.md", "PRESS_KIT.md"],
                CrewId::CodeImprovement => ["CODE_REVIEW.md", "REFACTORING.md"],
            };
            artifacts.extend(files.iter().map(|path| Artifact::new(path, summary.crew)));
        }
        for language in languages.iter().take(3) {
            let manifest = match *language {
                "Python" => "requirements.txt",
                "JavaScript" => "package.json",
                "Java" => "pom.xml",
                _ => continue,
            };
            artifacts.push(Artifact::new(manifest, CrewId::CodeImprovement));
        }
        artifacts.truncate(generated_files as usize);

        let metrics = BTreeMap::from([
            (MetricId::FilesAnalyzed, files_analyzed),
            (MetricId::LinesOfCode, lines_of_code),
            (MetricId::LanguagesDetected, languages_detected),
            (MetricId::ActiveAgents, selection.active_agent_total() as u64),
            (MetricId::GeneratedFiles, generated_files),
        ]);

        Self {
            metrics,
            total_time_secs,
            artifacts,
        }
    }
}

/// Displayed value of a numeric metric at `progress` percent.
pub fn interpolate(final_value: u64, progress: u8) -> u64 {
    let ratio = f64::from(progress.min(100)) / 100.0;
    (final_value as f64 * ratio).round() as u64
}

/// Simulated elapsed seconds, a function of progress alone since ticks are irregular.
pub fn elapsed_secs(progress: u8) -> u64 {
    u64::from(progress) / 2
}

pub fn step_index(progress: u8, step_count: usize) -> usize {
    let last = step_count.saturating_sub(1);
    let width = (100 / step_count.max(1)).max(1);
    last.min(usize::from(progress) / width)
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressState {
    status: RunStatus,
    value: u8,
    metrics: BTreeMap<MetricId, MetricValue>,
    steps: Vec<StepState>,
    revealed: usize,
}

impl ProgressState {
    fn idle(step_count: usize) -> Self {
        Self {
            status: RunStatus::Idle,
            value: 0,
            metrics: BTreeMap::new(),
            steps: vec![StepState::Pending; step_count],
            revealed: 0,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn metrics(&self) -> &BTreeMap<MetricId, MetricValue> {
        &self.metrics
    }

    pub fn steps(&self) -> &[StepState] {
        &self.steps
    }

    pub fn is_untouched(&self) -> bool {
        self.status == RunStatus::Idle && self.value == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run: u64,
    pub generated_files: usize,
    pub total_time_secs: u64,
    pub active_agents: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced { value: u8, step: usize },
    Completed(RunSummary),
    /// The tick belongs to a cancelled or finished run and was ignored.
    Stale,
}

pub struct ProgressSimulator {
    config: ProgressConfig,
    state: ProgressState,
    plan: Option<AnalysisPlan>,
    run: u64,
    pending_tick: Option<TimerHandle>,
}

impl ProgressSimulator {
    pub fn new(config: ProgressConfig) -> Self {
        let state = ProgressState::idle(config.steps.len());
        Self {
            config,
            state,
            plan: None,
            run: 0,
            pending_tick: None,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn run_id(&self) -> u64 {
        self.run
    }

    pub fn step_labels(&self) -> &[String] {
        &self.config.steps
    }

    pub fn current_step(&self) -> usize {
        step_index(self.state.value, self.config.steps.len())
    }

    pub fn pending_tick(&self) -> Option<TimerHandle> {
        self.pending_tick
    }

    /// Artifacts produced so far; all of them once the run is complete.
    pub fn artifacts(&self) -> &[Artifact] {
        match &self.plan {
            Some(plan) => &plan.artifacts[..self.state.revealed.min(plan.artifacts.len())],
            None => &[],
        }
    }

    pub fn start(
        &mut self,
        plan: AnalysisPlan,
        timers: &mut dyn Scheduler<TimerEvent>,
        rng: &mut dyn RngCore,
    ) -> Result<u64, EngineError> {
        if self.state.status == RunStatus::Running {
            return Err(EngineError::AlreadyRunning);
        }
        self.cancel_pending(timers);

        self.run += 1;
        self.plan = Some(plan);
        self.state = ProgressState::idle(self.config.steps.len());
        self.state.status = RunStatus::Running;
        self.apply_value(0);
        self.schedule_tick(timers, rng);

        tracing::info!("Analysis run {} started", self.run);
        Ok(self.run)
    }

    /// Cancel-then-start. Only valid once the previous run is idle or complete.
    pub fn restart(
        &mut self,
        plan: AnalysisPlan,
        timers: &mut dyn Scheduler<TimerEvent>,
        rng: &mut dyn RngCore,
    ) -> Result<u64, EngineError> {
        if self.state.status == RunStatus::Running {
            return Err(EngineError::InvalidTransition {
                from: self.state.status.as_str(),
                operation: "restart",
            });
        }
        self.cancel_pending(timers);
        tracing::info!("Restarting analysis after run {}", self.run);
        self.start(plan, timers, rng)
    }

    /// Abort a running analysis and return to a fresh idle state.
    pub fn cancel(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        if self.state.status != RunStatus::Running {
            return false;
        }
        self.cancel_pending(timers);
        self.plan = None;
        self.state = ProgressState::idle(self.config.steps.len());
        tracing::info!("Analysis run {} cancelled", self.run);
        true
    }

    pub fn tick(
        &mut self,
        run: u64,
        timers: &mut dyn Scheduler<TimerEvent>,
        rng: &mut dyn RngCore,
    ) -> TickOutcome {
        if run != self.run || self.state.status != RunStatus::Running {
            tracing::debug!("Discarding stale tick for run {} (current {})", run, self.run);
            return TickOutcome::Stale;
        }
        // A tick driven directly must not leave the scheduled one behind.
        self.cancel_pending(timers);

        let increment = rng.gen_range(self.config.increments());
        let value = self.state.value.saturating_add(increment).min(100);

        if value == 100 {
            return TickOutcome::Completed(self.complete());
        }

        self.apply_value(value);
        self.schedule_tick(timers, rng);
        TickOutcome::Advanced {
            value,
            step: self.current_step(),
        }
    }

    fn cancel_pending(&mut self, timers: &mut dyn Scheduler<TimerEvent>) {
        if let Some(handle) = self.pending_tick.take() {
            timers.cancel(handle);
        }
    }

    fn schedule_tick(&mut self, timers: &mut dyn Scheduler<TimerEvent>, rng: &mut dyn RngCore) {
        let delay = Duration::from_millis(rng.gen_range(self.config.tick_delays()));
        self.pending_tick = Some(timers.schedule(delay, TimerEvent::ProgressTick { run: self.run }));
    }

    fn apply_value(&mut self, value: u8) {
        self.state.value = value;

        let current = step_index(value, self.state.steps.len());
        for (position, step) in self.state.steps.iter_mut().enumerate() {
            *step = match position.cmp(&current) {
                std::cmp::Ordering::Less => StepState::Done,
                std::cmp::Ordering::Equal => StepState::Active,
                std::cmp::Ordering::Greater => StepState::Pending,
            };
        }

        if let Some(plan) = &self.plan {
            for (metric, final_value) in &plan.metrics {
                self.state
                    .metrics
                    .insert(*metric, MetricValue::Number(interpolate(*final_value, value)));
            }
            self.state.revealed = plan.artifacts.len() * usize::from(value) / 100;
        }
        self.state.metrics.insert(
            MetricId::AnalysisTime,
            MetricValue::Text(format!("{}s", elapsed_secs(value))),
        );
    }

    fn complete(&mut self) -> RunSummary {
        self.state.status = RunStatus::Complete;
        self.state.value = 100;
        self.state.steps.iter_mut().for_each(|step| *step = StepState::Done);

        let (generated_files, total_time_secs, active_agents) = match &self.plan {
            Some(plan) => {
                for (metric, final_value) in &plan.metrics {
                    self.state.metrics.insert(*metric, MetricValue::Number(*final_value));
                }
                self.state.revealed = plan.artifacts.len();
                (
                    plan.artifacts.len(),
                    plan.total_time_secs,
                    plan.metrics.get(&MetricId::ActiveAgents).copied().unwrap_or(0),
                )
            }
            None => (0, 0, 0),
        };
        self.state.metrics.insert(
            MetricId::AnalysisTime,
            MetricValue::Text(format!("{}s", total_time_secs)),
        );

        tracing::info!(
            "Analysis run {} complete: {} files generated in {}s",
            self.run,
            generated_files,
            total_time_secs
        );
        RunSummary {
            run: self.run,
            generated_files,
            total_time_secs,
            active_agents,
        }
    }
}
