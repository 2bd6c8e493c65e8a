//! The workflow shell: owns every component, applies commands and dispatches timer events.
//!
//! All state lives on one thread. Timers are typed [`TimerEvent`]s held in a
//! [`TimerQueue`]; the owner advances the virtual clock with [`Shell::advance_to`] and
//! drains the resulting [`ShellEvent`]s.

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::context::SessionContext;
use crate::cooldown::CooldownGate;
use crate::dialogue::{DialogueContext, DialogueResponder};
use crate::error::EngineError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::notification::{ActionHandler, ActionOutcome, Notice, NotificationController};
use crate::progress::{AnalysisPlan, ProgressSimulator, RunStatus, RunSummary, TickOutcome};
use crate::quick_action::{Modification, QuickActionKind, QuickActions};
use crate::recommendation::{Observation, RecommendationEngine};
use crate::scan::{ProjectScan, ScanReport, ScannedFile};
use crate::selection::SelectionModel;
use crate::types::{AgentSpan, CrewId, Recommendation, RecommendationAction, Stage, TimerEvent};
use crewflow_scheduler::{Scheduler, TimerHandle, TimerQueue};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PROJECT_NAME: &str = "my-project";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GoToStage(Stage),
    SetAgent { crew: CrewId, index: usize, active: bool },
    SetCrew { crew: CrewId, active: bool },
    SetLanguage { language: String, active: bool },
    DetectLanguages,
    RandomizeCrews,
    SetProjectFolder(PathBuf),
    StartAnalysis,
    RestartAnalysis,
    CancelAnalysis,
    ScanProject,
    /// Run a quick action over scanned files.
    QuickAction { kind: QuickActionKind, files: Vec<String> },
    CancelQuickAction,
    StartAutoDemo,
    /// Run the action attached to the visible notice.
    ExecuteAction,
    Dismiss,
    Say(String),
    Summarize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ShellEvent {
    NoticeShown { notice: Notice },
    NoticeCleared,
    Assistant { text: String },
    StageChanged { previous: Stage, current: Stage },
    Progress { value: u8, step: usize, label: String },
    AnalysisComplete { summary: RunSummary },
    LanguagesDetected { languages: Vec<String> },
    ScanComplete { report: ScanReport },
    QuickActionComplete { modification: Modification },
    Summary { summary: SessionSummary },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub stage: Stage,
    pub complexity_score: f64,
    pub languages: usize,
    pub crews: usize,
    pub recent_recommendations: Vec<String>,
    pub session_secs: u64,
    pub actions: u64,
    pub questions_asked: usize,
    pub progress: u8,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Followup {
    StageChanged { previous: Stage, current: Stage },
    SelectionChanged,
}

/// Everything recommendation actions may touch.
struct Workspace {
    config: EngineConfig,
    selection: SelectionModel,
    progress: ProgressSimulator,
    scan: ProjectScan,
    quick_actions: QuickActions,
    gate: CooldownGate,
    stage: Stage,
    project_folder: Option<PathBuf>,
    project_name: String,
    pending_reaction: Option<(CrewId, TimerHandle)>,
    auto_demo: Option<TimerHandle>,
    rng: StdRng,
    metrics: Arc<Metrics>,
    followups: VecDeque<Followup>,
    events: Vec<ShellEvent>,
}

impl Workspace {
    fn observe(&self, now: Duration) -> Observation<'_> {
        Observation {
            selection: &self.selection,
            progress: self.progress.state(),
            artifacts: self.progress.artifacts().len(),
            scanned_files: self.scan.files().len(),
            files_needing_work: self.scan.needs_work_count(),
            now,
        }
    }

    fn go_to(&mut self, stage: Stage) {
        if stage == self.stage {
            return;
        }
        let previous = std::mem::replace(&mut self.stage, stage);
        tracing::info!("Stage {} -> {}", previous, stage);
        self.followups.push_back(Followup::StageChanged {
            previous,
            current: stage,
        });
    }

    fn selection_changed(&mut self) {
        if self.followups.back() != Some(&Followup::SelectionChanged) {
            self.followups.push_back(Followup::SelectionChanged);
        }
    }

    fn cancel_reaction(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        match self.pending_reaction.take() {
            Some((_, handle)) => timers.cancel(handle),
            None => false,
        }
    }

    /// Cancel the pending reaction only if it belongs to `crew`.
    fn cancel_reaction_for(&mut self, crew: CrewId, timers: &mut dyn Scheduler<TimerEvent>) -> bool {
        match self.pending_reaction {
            Some((pending, _)) if pending == crew => self.cancel_reaction(timers),
            _ => false,
        }
    }

    /// Queue the assistant's reaction to `crew` changing. A reaction replacing a
    /// cancelled one keeps that one's cooldown slot. The reaction reads the crew's
    /// state when it fires.
    fn react(&mut self, crew: CrewId, replacing: bool, timers: &mut dyn Scheduler<TimerEvent>) {
        if !replacing && !self.gate.try_acquire(timers) {
            self.metrics.inc_reactions_suppressed();
            return;
        }
        let handle = timers.schedule(
            self.config.selection.reaction_delay(),
            TimerEvent::CrewReaction { crew },
        );
        self.pending_reaction = Some((crew, handle));
    }

    fn set_agent(
        &mut self,
        crew: CrewId,
        index: usize,
        active: bool,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> Result<usize, EngineError> {
        let count = self.selection.set_agent_at(crew, index, active)?;
        self.react(crew, false, timers);
        self.selection_changed();
        Ok(count)
    }

    fn set_crew(
        &mut self,
        crew: CrewId,
        active: bool,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> Result<usize, EngineError> {
        let replacing = self.cancel_reaction_for(crew, timers);
        let count = self.selection.set_crew(crew, active)?;
        self.react(crew, replacing, timers);
        self.selection_changed();
        Ok(count)
    }

    fn activate(
        &mut self,
        crew: CrewId,
        span: AgentSpan,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> Result<usize, EngineError> {
        let replacing = self.cancel_reaction_for(crew, timers);
        let count = self.selection.activate(crew, span)?;
        self.react(crew, replacing, timers);
        self.selection_changed();
        Ok(count)
    }

    fn set_language(&mut self, language: &str, active: bool) -> Result<usize, EngineError> {
        let count = self.selection.set_language(language, active)?;
        self.selection_changed();
        Ok(count)
    }

    fn randomize_crews(&mut self, timers: &mut dyn Scheduler<TimerEvent>) {
        self.cancel_reaction(timers);
        self.selection.randomize_crews(&mut self.rng);
        tracing::info!(
            "Randomized crews: {} agents active",
            self.selection.active_agent_total()
        );
        self.selection_changed();
    }

    fn detect_languages(&mut self) -> Vec<String> {
        let detected = self
            .selection
            .detect_languages(&mut self.rng, self.project_folder.is_some());
        tracing::info!("Detected languages: {}", detected.join(", "));
        self.events.push(ShellEvent::LanguagesDetected {
            languages: detected.clone(),
        });
        self.selection_changed();
        detected
    }

    fn start_analysis(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> Result<u64, EngineError> {
        if self.progress.state().status() == RunStatus::Running {
            return Err(EngineError::AlreadyRunning);
        }
        if self.config.selection.autofill_empty_selection {
            if self.selection.active_crew_count() == 0 {
                self.randomize_crews(timers);
            }
            if self.selection.language_count() == 0 {
                self.detect_languages();
            }
        }
        let plan = AnalysisPlan::generate(&self.selection, &mut self.rng);
        let run = self.progress.start(plan, timers, &mut self.rng)?;
        self.go_to(Stage::Results);
        Ok(run)
    }

    fn restart_analysis(&mut self, timers: &mut dyn Scheduler<TimerEvent>) -> Result<u64, EngineError> {
        let plan = AnalysisPlan::generate(&self.selection, &mut self.rng);
        let run = self.progress.restart(plan, timers, &mut self.rng)?;
        self.go_to(Stage::Results);
        Ok(run)
    }

    fn start_auto_demo(&mut self, timers: &mut dyn Scheduler<TimerEvent>) {
        if let Some(handle) = self.auto_demo.take() {
            timers.cancel(handle);
        }
        self.auto_demo = Some(timers.schedule(
            Duration::from_millis(self.config.auto_demo.start_delay_ms),
            TimerEvent::AutoDemoStep(1),
        ));
        tracing::info!("Auto demo scheduled");
    }

    fn crew_overview(&self) -> String {
        let crews: Vec<String> = self
            .selection
            .crews()
            .map(|crew| {
                format!(
                    "{} ({}/{})",
                    crew.label,
                    self.selection.active_count(crew.id),
                    crew.agents.len()
                )
            })
            .collect();
        format!("🎯 Crews: {}", crews.join(", "))
    }

    fn quick_actions(&self) -> String {
        let files: Vec<&str> = self
            .scan
            .files()
            .iter()
            .filter(|file| file.status.needs_work())
            .map(|file| file.name.as_str())
            .collect();
        if files.is_empty() {
            return "⚡ No scanned file needs work yet.".to_string();
        }
        format!("⚡ Quick actions available for: {}", files.join(", "))
    }
}

impl ActionHandler for Workspace {
    fn perform(
        &mut self,
        action: &RecommendationAction,
        timers: &mut dyn Scheduler<TimerEvent>,
    ) -> Result<Option<Notice>, EngineError> {
        tracing::debug!("Performing {:?}", action);
        match action {
            RecommendationAction::GoToStage { stage } => {
                self.go_to(*stage);
                Ok(None)
            }
            RecommendationAction::StartAnalysis => {
                self.start_analysis(timers)?;
                Ok(None)
            }
            RecommendationAction::ActivateCrew { crew, agents } => {
                let count = self.activate(*crew, *agents, timers)?;
                let label = self.selection.crew_label(*crew).unwrap_or_default();
                Ok(Some(Notice::success(format!(
                    "✅ {} activated! {} agent(s) configured.",
                    label, count
                ))))
            }
            RecommendationAction::ScanProject => {
                self.scan.start(self.config.scan_delay(), timers);
                Ok(Some(Notice::info("🔍 Scanning project files...")))
            }
            RecommendationAction::StartAutoDemo => {
                self.start_auto_demo(timers);
                Ok(Some(Notice::info(
                    "🚀 Automatic demo started! Follow the guide...",
                )))
            }
            RecommendationAction::RevealCrews => Ok(Some(Notice::info(self.crew_overview()))),
            RecommendationAction::RevealQuickActions => Ok(Some(Notice::info(self.quick_actions()))),
        }
    }
}

pub struct Shell {
    timers: TimerQueue<TimerEvent>,
    notifications: NotificationController,
    engine: RecommendationEngine,
    dialogue: DialogueResponder,
    workspace: Workspace,
    metrics: Arc<Metrics>,
}

impl Shell {
    pub fn new(config: EngineConfig, catalog: Catalog) -> Result<Self, EngineError> {
        config.validate()?;
        let selection = SelectionModel::new(catalog)?;

        let mut timers = TimerQueue::new();
        timers.schedule_every(config.summary_interval(), TimerEvent::SummaryRefresh)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let metrics = Metrics::new();

        let workspace = Workspace {
            selection,
            progress: ProgressSimulator::new(config.progress.clone()),
            scan: ProjectScan::new(),
            quick_actions: QuickActions::new(config.modification_history_cap),
            gate: CooldownGate::new(config.selection.cooldown()),
            stage: Stage::Configuration,
            project_folder: None,
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            pending_reaction: None,
            auto_demo: None,
            rng,
            metrics: Arc::clone(&metrics),
            followups: VecDeque::new(),
            events: Vec::new(),
            config: config.clone(),
        };

        tracing::info!("Workflow shell ready (seed: {:?})", config.seed);
        Ok(Self {
            engine: RecommendationEngine::new(config.recommendations.clone(), timers.now()),
            notifications: NotificationController::new(config.notifications.clone()),
            dialogue: DialogueResponder::new(),
            timers,
            workspace,
            metrics,
        })
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    pub fn stage(&self) -> Stage {
        self.workspace.stage
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.workspace.selection
    }

    pub fn progress(&self) -> &ProgressSimulator {
        &self.workspace.progress
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notifications.current()
    }

    pub fn context(&self) -> &SessionContext {
        self.engine.context()
    }

    pub fn scanned_files(&self) -> &[ScannedFile] {
        self.workspace.scan.files()
    }

    pub fn project_folder(&self) -> Option<&Path> {
        self.workspace.project_folder.as_deref()
    }

    /// Completed quick actions, newest first.
    pub fn modifications(&self) -> impl Iterator<Item = &Modification> {
        self.workspace.quick_actions.history()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn summary(&self) -> SessionSummary {
        let context = self.engine.context();
        SessionSummary {
            stage: self.workspace.stage,
            complexity_score: context.complexity_score(),
            languages: self.workspace.selection.language_count(),
            crews: self.workspace.selection.active_crew_count(),
            recent_recommendations: self
                .engine
                .recent(3)
                .into_iter()
                .map(|rec| rec.title.clone())
                .collect(),
            session_secs: context.age(self.timers.now()).as_secs(),
            actions: context.action_count(),
            questions_asked: context.questions_asked().len(),
            progress: self.workspace.progress.state().value(),
            metrics: self.metrics.snapshot(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<ShellEvent> {
        std::mem::take(&mut self.workspace.events)
    }

    pub fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        tracing::debug!("Applying {:?}", command);
        let result = self.execute(command);
        self.settle();
        result
    }

    /// Fire every timer due up to `until`, in deadline order.
    pub fn advance_to(&mut self, until: Duration) {
        while let Some(event) = self.timers.pop_due(until) {
            self.dispatch(event);
            self.settle();
        }
        self.timers.advance_clock(until);
    }

    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now() + by;
        self.advance_to(until);
    }

    fn execute(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::GoToStage(stage) => self.workspace.go_to(stage),
            Command::SetAgent { crew, index, active } => {
                self.workspace.set_agent(crew, index, active, &mut self.timers)?;
            }
            Command::SetCrew { crew, active } => {
                self.workspace.set_crew(crew, active, &mut self.timers)?;
            }
            Command::SetLanguage { language, active } => {
                self.workspace.set_language(&language, active)?;
            }
            Command::DetectLanguages => {
                self.workspace.detect_languages();
            }
            Command::RandomizeCrews => self.workspace.randomize_crews(&mut self.timers),
            Command::SetProjectFolder(path) => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
                let duration = self.workspace.config.notifications.confirmation();
                self.show(Notice::info(format!("📁 Project folder: {}", name)), duration);
                self.workspace.project_name = name;
                self.workspace.project_folder = Some(path);
            }
            Command::StartAnalysis => self.perform(RecommendationAction::StartAnalysis)?,
            Command::RestartAnalysis => {
                self.workspace.restart_analysis(&mut self.timers)?;
            }
            Command::CancelAnalysis => {
                if !self.workspace.progress.cancel(&mut self.timers) {
                    return Err(EngineError::InvalidTransition {
                        from: self.workspace.progress.state().status().as_str(),
                        operation: "cancel",
                    });
                }
            }
            Command::ScanProject => self.perform(RecommendationAction::ScanProject)?,
            Command::QuickAction { kind, files } => self.start_quick_action(kind, &files)?,
            Command::CancelQuickAction => {
                if self.workspace.quick_actions.cancel(&mut self.timers) {
                    let duration = self.workspace.config.notifications.confirmation();
                    self.show(Notice::info("⏹️ Quick action cancelled."), duration);
                }
            }
            Command::StartAutoDemo => self.perform(RecommendationAction::StartAutoDemo)?,
            Command::ExecuteAction => self.execute_action(),
            Command::Dismiss => {
                if self.notifications.hide(&mut self.timers) {
                    self.workspace.events.push(ShellEvent::NoticeCleared);
                }
            }
            Command::Say(text) => self.say(&text),
            Command::Summarize => {
                let summary = self.summary();
                self.workspace.events.push(ShellEvent::Summary { summary });
            }
        }
        Ok(())
    }

    fn start_quick_action(&mut self, kind: QuickActionKind, files: &[String]) -> Result<(), EngineError> {
        let delay = self.workspace.config.quick_action_delay();
        let count = self.workspace.quick_actions.start(
            kind,
            files,
            self.workspace.scan.files(),
            delay,
            &mut self.timers,
        )?;
        let duration = self.workspace.config.notifications.confirmation();
        self.show(
            Notice::info(format!(
                "🔄 {} in progress... {} file(s), estimated {}s",
                kind.title(),
                count,
                count * 2
            )),
            duration,
        );
        Ok(())
    }

    fn perform(&mut self, action: RecommendationAction) -> Result<(), EngineError> {
        if let Some(notice) = self.workspace.perform(&action, &mut self.timers)? {
            let duration = self.workspace.config.notifications.confirmation();
            self.show(notice, duration);
        }
        Ok(())
    }

    fn execute_action(&mut self) {
        let outcome = self
            .notifications
            .execute_action(&mut self.timers, &mut self.workspace);
        if let ActionOutcome::NoAction = outcome {
            tracing::debug!("No action attached to the current notice");
            return;
        }

        let visible = self.notifications.current().cloned();
        self.workspace.events.push(match &visible {
            Some(notice) => ShellEvent::NoticeShown {
                notice: notice.clone(),
            },
            None => ShellEvent::NoticeCleared,
        });

        match outcome {
            ActionOutcome::Completed(action) => {
                tracing::info!("Action {:?} completed", action);
                // The confirmation stays on top of recommendations the action triggered.
                if self.settle() {
                    if let Some(confirmation) = visible {
                        let duration = self.workspace.config.notifications.confirmation();
                        self.show(confirmation, duration);
                    }
                }
            }
            ActionOutcome::Failed { .. } => self.metrics.inc_action_failures(),
            ActionOutcome::NoAction => {}
        }
    }

    fn say(&mut self, text: &str) {
        let reply = {
            let context = DialogueContext {
                selection: &self.workspace.selection,
                asked: self.engine.context().questions_asked(),
                has_project_folder: self.workspace.project_folder.is_some(),
                project_name: &self.workspace.project_name,
            };
            self.dialogue.respond(text, &context, &mut self.workspace.rng)
        };
        if let Some(question) = reply.asked {
            self.engine.record_question(question);
        }
        self.workspace.events.push(ShellEvent::Assistant { text: reply.text });
    }

    fn show(&mut self, notice: Notice, duration: Duration) {
        if self.notifications.show(notice.clone(), duration, &mut self.timers) {
            self.metrics.inc_notifications_replaced();
        }
        self.workspace.events.push(ShellEvent::NoticeShown { notice });
    }

    fn surface(&mut self, recommendation: Recommendation) {
        self.metrics.inc_recommendations();
        let duration = self.workspace.config.notifications.duration();
        self.show(Notice::from(recommendation), duration);
    }

    /// Run the recommendation engine for every stage or selection change queued so far.
    /// Returns `true` if a recommendation was surfaced.
    fn settle(&mut self) -> bool {
        let mut surfaced = false;
        while let Some(followup) = self.workspace.followups.pop_front() {
            let now = self.timers.now();
            let recommendation = match followup {
                Followup::StageChanged { previous, current } => {
                    self.workspace
                        .events
                        .push(ShellEvent::StageChanged { previous, current });
                    let observation = self.workspace.observe(now);
                    self.engine.on_stage_enter(previous, current, &observation)
                }
                Followup::SelectionChanged => {
                    let observation = self.workspace.observe(now);
                    self.engine.on_selection_changed(&observation)
                }
            };
            if let Some(recommendation) = recommendation {
                self.surface(recommendation);
                surfaced = true;
            }
        }
        surfaced
    }

    fn dispatch(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::ProgressTick { run } => self.on_tick(run),
            TimerEvent::CooldownExpired => self.workspace.gate.on_expired(),
            TimerEvent::CrewReaction { crew } => {
                if let Some((_, handle)) = self.workspace.pending_reaction {
                    if !self.timers.is_pending(handle) {
                        self.workspace.pending_reaction = None;
                    }
                }
                let active = self.workspace.selection.is_crew_active(crew);
                let label = self
                    .workspace
                    .selection
                    .crew_label(crew)
                    .unwrap_or_default()
                    .to_string();
                let text = self
                    .dialogue
                    .crew_reaction(&label, active, &mut self.workspace.rng);
                self.workspace.events.push(ShellEvent::Assistant { text });
            }
            TimerEvent::DismissNotice { generation } => {
                if self.notifications.on_dismiss(generation) {
                    self.workspace.events.push(ShellEvent::NoticeCleared);
                }
            }
            TimerEvent::ScanComplete => {
                if let Some(report) = self.workspace.scan.complete() {
                    self.workspace.events.push(ShellEvent::ScanComplete { report });
                    let duration = self.workspace.config.notifications.duration();
                    self.show(
                        Notice::success(format!(
                            "✅ Scan complete! {} files analysed, {} need improvements, {} need a security review.",
                            report.total, report.improvable, report.security_review
                        )),
                        duration,
                    );
                }
            }
            TimerEvent::QuickActionComplete => {
                if let Some(modification) = self.workspace.quick_actions.complete() {
                    let duration = self.workspace.config.notifications.duration();
                    self.show(
                        Notice::success(format!("🎉 Action complete! {}", modification.result)),
                        duration,
                    );
                    self.workspace
                        .events
                        .push(ShellEvent::QuickActionComplete { modification });
                }
            }
            TimerEvent::AutoDemoStep(step) => self.auto_demo_step(step),
            TimerEvent::SummaryRefresh => {
                let summary = self.summary();
                tracing::info!(
                    "Session summary: stage {}, complexity {}, {} crews, {} languages, {} actions",
                    summary.stage,
                    summary.complexity_score,
                    summary.crews,
                    summary.languages,
                    summary.actions
                );
                self.workspace.events.push(ShellEvent::Summary { summary });
            }
        }
    }

    fn on_tick(&mut self, run: u64) {
        let outcome = self
            .workspace
            .progress
            .tick(run, &mut self.timers, &mut self.workspace.rng);
        match outcome {
            TickOutcome::Advanced { value, step } => {
                self.metrics.inc_ticks_applied();
                let label = self
                    .workspace
                    .progress
                    .step_labels()
                    .get(step)
                    .cloned()
                    .unwrap_or_default();
                self.workspace
                    .events
                    .push(ShellEvent::Progress { value, step, label });
            }
            TickOutcome::Completed(summary) => {
                self.metrics.inc_ticks_applied();
                let duration = self.workspace.config.notifications.duration();
                self.show(
                    Notice::success(format!(
                        "🎉 Analysis complete! {} files generated in {}s by {} agents.",
                        summary.generated_files, summary.total_time_secs, summary.active_agents
                    )),
                    duration,
                );
                self.workspace
                    .events
                    .push(ShellEvent::AnalysisComplete { summary });
            }
            TickOutcome::Stale => self.metrics.inc_stale_ticks(),
        }
    }

    fn auto_demo_step(&mut self, step: u8) {
        self.workspace.auto_demo = None;
        let notifications = self.workspace.config.notifications.clone();
        let step_delay = Duration::from_millis(self.workspace.config.auto_demo.step_delay_ms);

        let (text, duration, next) = match step {
            1 => {
                self.workspace.detect_languages();
                ("1️⃣ Languages detected automatically!", notifications.demo_step(), Some(2))
            }
            2 => {
                self.workspace.randomize_crews(&mut self.timers);
                ("2️⃣ Crews configured automatically!", notifications.demo_step(), Some(3))
            }
            _ => match self.workspace.start_analysis(&mut self.timers) {
                Ok(_) => (
                    "3️⃣ Analysis started! Check the results...",
                    notifications.confirmation(),
                    None,
                ),
                Err(error) => {
                    tracing::warn!("Auto demo could not start the analysis: {}", error);
                    self.workspace.events.push(ShellEvent::Error {
                        message: error.to_string(),
                    });
                    return;
                }
            },
        };

        // Recommendations triggered by the step come first; the step notice stays visible.
        self.settle();
        self.show(Notice::info(text), duration);
        if let Some(next) = next {
            self.workspace.auto_demo =
                Some(self.timers.schedule(step_delay, TimerEvent::AutoDemoStep(next)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        let config = EngineConfig {
            seed: Some(42),
            ..EngineConfig::default()
        };
        Shell::new(config, Catalog::default()).unwrap()
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn assistant_messages(events: &[ShellEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, ShellEvent::Assistant { .. }))
            .count()
    }

    #[test]
    fn test_first_selection_change_recommends() {
        let mut shell = shell();
        shell
            .apply(Command::SetLanguage {
                language: "Python".to_string(),
                active: true,
            })
            .unwrap();

        let notice = shell.notice().unwrap();
        assert!(notice.text.contains("No crew active"));
        assert_eq!(shell.metrics().recommendations, 1);
    }

    #[test]
    fn test_cooldown_limits_reactions() {
        let mut shell = shell();
        let set = |index| Command::SetAgent {
            crew: CrewId::Documentation,
            index,
            active: true,
        };

        shell.apply(set(0)).unwrap();
        shell.advance(ms(500));
        shell.apply(set(1)).unwrap();
        shell.advance(ms(2600));
        assert_eq!(assistant_messages(&shell.drain_events()), 1);
        assert_eq!(shell.metrics().reactions_suppressed, 1);

        shell.apply(set(2)).unwrap();
        shell.advance(ms(1000));
        assert_eq!(assistant_messages(&shell.drain_events()), 1);
    }

    #[test]
    fn test_whole_crew_replaces_pending_reaction() {
        let mut shell = shell();
        shell
            .apply(Command::SetAgent {
                crew: CrewId::Security,
                index: 0,
                active: true,
            })
            .unwrap();
        shell
            .apply(Command::SetCrew {
                crew: CrewId::Security,
                active: false,
            })
            .unwrap();
        shell.advance(ms(1000));

        let events = shell.drain_events();
        assert_eq!(assistant_messages(&events), 1);
        let reaction = events.iter().find_map(|event| match event {
            ShellEvent::Assistant { text } => Some(text.clone()),
            _ => None,
        });
        assert!(reaction.unwrap().contains("disabled"));
    }

    fn reactions(events: &[ShellEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                ShellEvent::Assistant { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_reaction_reflects_state_when_delivered() {
        let mut shell = shell();
        let set = |active| Command::SetAgent {
            crew: CrewId::Documentation,
            index: 0,
            active,
        };

        shell.apply(set(true)).unwrap();
        shell.advance(ms(200));
        shell.apply(set(false)).unwrap();
        shell.advance(ms(1000));

        assert!(!shell.selection().is_crew_active(CrewId::Documentation));
        let said = reactions(&shell.drain_events());
        assert_eq!(said.len(), 1);
        assert!(said[0].contains("disabled"));
        assert_eq!(shell.metrics().reactions_suppressed, 1);
    }

    #[test]
    fn test_other_crew_change_keeps_pending_reaction() {
        let mut shell = shell();
        shell
            .apply(Command::SetAgent {
                crew: CrewId::Security,
                index: 0,
                active: true,
            })
            .unwrap();
        shell
            .apply(Command::SetCrew {
                crew: CrewId::Documentation,
                active: true,
            })
            .unwrap();
        shell.advance(ms(1000));

        let said = reactions(&shell.drain_events());
        assert_eq!(said.len(), 1);
        let security = shell.selection().crew_label(CrewId::Security).unwrap().to_string();
        assert!(said[0].contains(&security));
        assert_eq!(shell.metrics().reactions_suppressed, 1);
    }

    #[test]
    fn test_quick_action_records_modification() {
        let mut shell = shell();
        let files = vec!["app.js".to_string(), "utils.py".to_string()];
        assert!(matches!(
            shell.apply(Command::QuickAction {
                kind: QuickActionKind::Comments,
                files: files.clone(),
            }),
            Err(EngineError::UnknownFile(_))
        ));

        shell.apply(Command::ScanProject).unwrap();
        shell.advance(ms(1000));
        shell
            .apply(Command::QuickAction {
                kind: QuickActionKind::Comments,
                files,
            })
            .unwrap();
        assert!(shell.notice().unwrap().text.contains("estimated 4s"));
        shell.drain_events();

        shell.advance(ms(1499));
        assert_eq!(shell.modifications().count(), 0);
        shell.advance(ms(1));
        let events = shell.drain_events();
        assert!(events
            .iter()
            .any(|event| matches!(event, ShellEvent::QuickActionComplete { .. })));
        let latest = shell.modifications().next().unwrap();
        assert_eq!(latest.result, "✅ 30 comments added");
        assert!(shell.notice().unwrap().text.contains("30 comments added"));
    }

    #[test]
    fn test_cancelled_quick_action_never_completes() {
        let mut shell = shell();
        shell.apply(Command::ScanProject).unwrap();
        shell.advance(ms(1000));
        shell
            .apply(Command::QuickAction {
                kind: QuickActionKind::Bugs,
                files: vec!["database.py".to_string()],
            })
            .unwrap();
        shell.apply(Command::CancelQuickAction).unwrap();
        shell.advance(ms(2000));

        assert_eq!(shell.modifications().count(), 0);
        assert!(!shell
            .drain_events()
            .iter()
            .any(|event| matches!(event, ShellEvent::QuickActionComplete { .. })));
    }

    #[test]
    fn test_analysis_runs_to_completion() {
        let mut shell = shell();
        shell.apply(Command::StartAnalysis).unwrap();
        assert_eq!(shell.stage(), Stage::Results);
        assert!(shell.selection().active_crew_count() > 0);
        assert!(matches!(
            shell.apply(Command::StartAnalysis),
            Err(EngineError::AlreadyRunning)
        ));

        shell.advance(Duration::from_secs(25));
        let events = shell.drain_events();
        let completions = events
            .iter()
            .filter(|event| matches!(event, ShellEvent::AnalysisComplete { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(shell.progress().state().status(), RunStatus::Complete);
        assert!(shell.notice().unwrap().text.starts_with("🎉"));
    }

    #[test]
    fn test_restart_discards_previous_run() {
        let mut shell = shell();
        shell.apply(Command::StartAnalysis).unwrap();
        assert!(matches!(
            shell.apply(Command::RestartAnalysis),
            Err(EngineError::InvalidTransition { .. })
        ));

        shell.apply(Command::CancelAnalysis).unwrap();
        shell.apply(Command::RestartAnalysis).unwrap();
        shell.advance(Duration::from_secs(25));
        assert_eq!(shell.progress().run_id(), 2);
        assert_eq!(shell.metrics().stale_ticks, 0);
        assert_eq!(shell.progress().state().value(), 100);
    }

    #[test]
    fn test_results_without_run_action_navigates_back() {
        let mut shell = shell();
        shell.apply(Command::GoToStage(Stage::Results)).unwrap();
        assert!(shell.notice().unwrap().text.contains("Analysis not started"));

        shell.apply(Command::ExecuteAction).unwrap();
        assert_eq!(shell.stage(), Stage::Configuration);
    }

    #[test]
    fn test_scan_action_from_improvement() {
        let mut shell = shell();
        shell.apply(Command::GoToStage(Stage::Improvement)).unwrap();
        assert!(shell.notice().unwrap().text.contains("Scan recommended"));

        shell.apply(Command::ExecuteAction).unwrap();
        shell.advance(ms(1000));
        assert_eq!(shell.scanned_files().len(), 10);

        shell.apply(Command::GoToStage(Stage::Configuration)).unwrap();
        shell.apply(Command::GoToStage(Stage::Improvement)).unwrap();
        assert!(shell.notice().unwrap().text.contains("3 file(s)"));
    }

    #[test]
    fn test_failed_action_is_contained() {
        let mut shell = shell();
        shell.apply(Command::StartAnalysis).unwrap();
        shell.apply(Command::GoToStage(Stage::Configuration)).unwrap();
        shell
            .apply(Command::SetCrew {
                crew: CrewId::Security,
                active: false,
            })
            .unwrap();
        // Fabricate a notice whose action cannot succeed while a run is active.
        let duration = shell.workspace.config.notifications.duration();
        shell.show(
            Notice::info("start").with_action(crate::types::RecommendedAction::new(
                "Start",
                RecommendationAction::StartAnalysis,
            )),
            duration,
        );

        shell.apply(Command::ExecuteAction).unwrap();
        assert_eq!(shell.metrics().action_failures, 1);
        assert!(shell.notice().unwrap().text.contains("already in progress"));
    }

    #[test]
    fn test_auto_demo_sequence() {
        let mut shell = shell();
        shell.apply(Command::StartAutoDemo).unwrap();
        shell.advance(ms(2000));
        assert!(shell.selection().language_count() >= 2);
        assert!(shell.notice().unwrap().text.starts_with("1️⃣"));

        shell.advance(ms(3000));
        assert_eq!(shell.selection().active_crew_count(), 4);

        shell.advance(ms(3000));
        assert_eq!(shell.stage(), Stage::Results);
        assert_eq!(shell.progress().state().status(), RunStatus::Running);
    }

    #[test]
    fn test_summary_refresh_every_interval() {
        let mut shell = shell();
        shell.drain_events();
        shell.advance(Duration::from_secs(61));
        let summaries = shell
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, ShellEvent::Summary { .. }))
            .count();
        assert_eq!(summaries, 2);
    }

    #[test]
    fn test_first_chat_message_asks_contextual_question() {
        let mut shell = shell();
        shell
            .apply(Command::SetCrew {
                crew: CrewId::Documentation,
                active: true,
            })
            .unwrap();
        shell.drain_events();

        shell.apply(Command::Say("hello".to_string())).unwrap();
        assert_eq!(shell.context().questions_asked().len(), 1);
        shell.apply(Command::Say("any question?".to_string())).unwrap();
        assert_eq!(shell.context().questions_asked().len(), 1);
    }
}
