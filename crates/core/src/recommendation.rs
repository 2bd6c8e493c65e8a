//! Contextual recommendation rules.
//!
//! Each entry point refreshes the [`SessionContext`] and walks one ordered rule table.
//! The first rule that matches wins; `priority` only drives presentation.

use crate::config::RecommendationConfig;
use crate::context::SessionContext;
use crate::dialogue::QuestionId;
use crate::progress::{ProgressState, RunStatus};
use crate::selection::SelectionModel;
use crate::types::{
    AgentSpan, CrewId, Priority, Recommendation, RecommendationAction, RecommendationKind,
    RecommendedAction, Stage,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    StageEnter { previous: Stage, current: Stage },
    SelectionChanged,
}

/// Read-only view of the components the rules look at.
pub struct Observation<'a> {
    pub selection: &'a SelectionModel,
    pub progress: &'a ProgressState,
    pub artifacts: usize,
    pub scanned_files: usize,
    pub files_needing_work: usize,
    pub now: Duration,
}

struct RuleInput<'a> {
    trigger: Trigger,
    context: &'a SessionContext,
    observation: &'a Observation<'a>,
    config: &'a RecommendationConfig,
}

impl RuleInput<'_> {
    fn entered(&self, stage: Stage) -> bool {
        matches!(self.trigger, Trigger::StageEnter { current, .. } if current == stage)
    }

    /// Stage entry into Configuration, or a selection change while there.
    fn configuring(&self) -> bool {
        match self.trigger {
            Trigger::StageEnter { current, .. } => current == Stage::Configuration,
            Trigger::SelectionChanged => self.context.stage == Stage::Configuration,
        }
    }
}

type Rule = fn(&RuleInput<'_>) -> Option<Recommendation>;

const RULES: [(&str, Rule); 10] = [
    ("results_without_run", results_without_run),
    ("improvement_after_results", improvement_after_results),
    ("improvement_unscanned", improvement_unscanned),
    ("multi_language_without_security", multi_language_without_security),
    ("no_crew_active", no_crew_active),
    ("missing_improvement_crew", missing_improvement_crew),
    ("complex_project", complex_project),
    ("idle_session", idle_session),
    ("results_ready_for_improvement", results_ready_for_improvement),
    ("files_need_work", files_need_work),
];

fn recommend(
    kind: RecommendationKind,
    priority: Priority,
    title: &str,
    message: String,
    action: RecommendedAction,
) -> Recommendation {
    Recommendation {
        kind,
        priority,
        title: title.to_string(),
        message,
        action: Some(action),
    }
}

fn activate_security() -> RecommendedAction {
    RecommendedAction::new(
        "Activate Security",
        RecommendationAction::ActivateCrew {
            crew: CrewId::Security,
            agents: AgentSpan::First(2),
        },
    )
}

fn results_without_run(input: &RuleInput<'_>) -> Option<Recommendation> {
    if !input.entered(Stage::Results) || !input.observation.progress.is_untouched() {
        return None;
    }
    Some(recommend(
        RecommendationKind::WorkflowGuidance,
        Priority::High,
        "Analysis not started",
        "You are viewing results without running an analysis. Go back to configuration to start one!"
            .to_string(),
        RecommendedAction::new(
            "Start analysis",
            RecommendationAction::GoToStage {
                stage: Stage::Configuration,
            },
        ),
    ))
}

fn improvement_after_results(input: &RuleInput<'_>) -> Option<Recommendation> {
    let from_results = matches!(
        input.trigger,
        Trigger::StageEnter {
            previous: Stage::Results,
            current: Stage::Improvement,
        }
    );
    if !from_results || input.observation.artifacts == 0 {
        return None;
    }
    Some(recommend(
        RecommendationKind::CrossReference,
        Priority::Medium,
        "Files detected",
        format!(
            "Your analysis generated {} files. Scan them for improvements!",
            input.observation.artifacts
        ),
        RecommendedAction::new("Scan files", RecommendationAction::ScanProject),
    ))
}

fn improvement_unscanned(input: &RuleInput<'_>) -> Option<Recommendation> {
    if !input.entered(Stage::Improvement) || input.observation.scanned_files > 0 {
        return None;
    }
    Some(recommend(
        RecommendationKind::ActionNeeded,
        Priority::Medium,
        "Scan recommended",
        "Start by scanning your files to get tailored improvement suggestions.".to_string(),
        RecommendedAction::new("Scan now", RecommendationAction::ScanProject),
    ))
}

fn multi_language_without_security(input: &RuleInput<'_>) -> Option<Recommendation> {
    let selection = input.observation.selection;
    if !input.configuring()
        || selection.language_count() <= input.config.multi_language_threshold
        || selection.is_crew_active(CrewId::Security)
    {
        return None;
    }
    Some(recommend(
        RecommendationKind::SecurityAdvice,
        Priority::Medium,
        "Multi-language project",
        format!(
            "{} languages selected. The Security crew is recommended!",
            selection.language_count()
        ),
        activate_security(),
    ))
}

fn no_crew_active(input: &RuleInput<'_>) -> Option<Recommendation> {
    if !input.configuring() || input.observation.selection.active_crew_count() > 0 {
        return None;
    }
    Some(recommend(
        RecommendationKind::WorkflowGuidance,
        Priority::High,
        "No crew active",
        "Select at least one crew to start your analysis!".to_string(),
        RecommendedAction::new("Show crews", RecommendationAction::RevealCrews),
    ))
}

fn missing_improvement_crew(input: &RuleInput<'_>) -> Option<Recommendation> {
    let selection = input.observation.selection;
    if !input.configuring()
        || selection.active_crew_count() == 0
        || selection.is_crew_active(CrewId::CodeImprovement)
    {
        return None;
    }
    Some(recommend(
        RecommendationKind::ImprovementAdvice,
        Priority::Medium,
        "Code improvement",
        "Add the Code Improvement crew for optimization suggestions!".to_string(),
        RecommendedAction::new(
            "Activate Improvement",
            RecommendationAction::ActivateCrew {
                crew: CrewId::CodeImprovement,
                agents: AgentSpan::All,
            },
        ),
    ))
}

fn complex_project(input: &RuleInput<'_>) -> Option<Recommendation> {
    if input.context.stage != Stage::Configuration
        || input.context.complexity_score <= input.config.complexity_threshold
    {
        return None;
    }
    Some(recommend(
        RecommendationKind::ComplexityWarning,
        Priority::Medium,
        "Complex project detected",
        format!(
            "Your project looks complex ({} languages). Consider enabling the Security crew.",
            input.observation.selection.language_count()
        ),
        activate_security(),
    ))
}

fn idle_session(input: &RuleInput<'_>) -> Option<Recommendation> {
    let idle = Duration::from_secs(input.config.idle_session_secs);
    if input.context.age(input.observation.now) <= idle
        || input.context.action_count >= input.config.min_actions
    {
        return None;
    }
    Some(recommend(
        RecommendationKind::Engagement,
        Priority::Low,
        "Exploration suggested",
        "You have been exploring for a while. Want to try the full automatic demo?".to_string(),
        RecommendedAction::new("Auto demo", RecommendationAction::StartAutoDemo),
    ))
}

fn results_ready_for_improvement(input: &RuleInput<'_>) -> Option<Recommendation> {
    if !input.entered(Stage::Results)
        || input.observation.progress.status() != RunStatus::Complete
        || input.observation.artifacts <= input.config.improvement_hint_artifacts
    {
        return None;
    }
    Some(recommend(
        RecommendationKind::CrossReference,
        Priority::Medium,
        "Analysis complete",
        format!(
            "{} files generated. Move on to improvement to polish them!",
            input.observation.artifacts
        ),
        RecommendedAction::new(
            "Improve",
            RecommendationAction::GoToStage {
                stage: Stage::Improvement,
            },
        ),
    ))
}

fn files_need_work(input: &RuleInput<'_>) -> Option<Recommendation> {
    if !input.entered(Stage::Improvement) || input.observation.files_needing_work == 0 {
        return None;
    }
    Some(recommend(
        RecommendationKind::ActionNeeded,
        Priority::Medium,
        "Files need attention",
        format!(
            "{} file(s) need improvements. Use the quick actions!",
            input.observation.files_needing_work
        ),
        RecommendedAction::new("Quick actions", RecommendationAction::RevealQuickActions),
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub rule: &'static str,
    pub recommendation: Recommendation,
}

pub struct RecommendationEngine {
    config: RecommendationConfig,
    context: SessionContext,
    history: VecDeque<HistoryEntry>,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig, started_at: Duration) -> Self {
        Self {
            config,
            context: SessionContext::new(started_at),
            history: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn history(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Most recent recommendations, newest last.
    pub fn recent(&self, count: usize) -> Vec<&Recommendation> {
        let skip = self.history.len().saturating_sub(count);
        self.history
            .iter()
            .skip(skip)
            .map(|entry| &entry.recommendation)
            .collect()
    }

    pub fn on_stage_enter(
        &mut self,
        previous: Stage,
        current: Stage,
        observation: &Observation<'_>,
    ) -> Option<Recommendation> {
        self.context.stage = current;
        self.evaluate(Trigger::StageEnter { previous, current }, observation)
    }

    pub fn on_selection_changed(&mut self, observation: &Observation<'_>) -> Option<Recommendation> {
        self.evaluate(Trigger::SelectionChanged, observation)
    }

    /// Returns `false` if the question had already been asked this session.
    pub fn record_question(&mut self, question: QuestionId) -> bool {
        self.context.questions_asked.insert(question)
    }

    fn evaluate(&mut self, trigger: Trigger, observation: &Observation<'_>) -> Option<Recommendation> {
        self.context.update(observation.selection);

        let input = RuleInput {
            trigger,
            context: &self.context,
            observation,
            config: &self.config,
        };
        let (rule, recommendation) = RULES
            .iter()
            .find_map(|(name, rule)| rule(&input).map(|rec| (*name, rec)))?;

        tracing::info!(
            "Recommendation '{}' ({:?}) for {:?}",
            rule,
            recommendation.priority,
            trigger
        );
        self.history.push_back(HistoryEntry {
            at: Utc::now(),
            rule,
            recommendation: recommendation.clone(),
        });
        while self.history.len() > self.config.history_cap {
            self.history.pop_front();
        }
        Some(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::ProgressConfig;
    use crate::progress::{AnalysisPlan, ProgressSimulator};
    use crate::types::TimerEvent;
    use crewflow_scheduler::TimerQueue;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        selection: SelectionModel,
        progress: ProgressSimulator,
        artifacts: usize,
        scanned_files: usize,
        files_needing_work: usize,
        now: Duration,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                selection: SelectionModel::new(Catalog::default()).unwrap(),
                progress: ProgressSimulator::new(ProgressConfig::default()),
                artifacts: 0,
                scanned_files: 0,
                files_needing_work: 0,
                now: Duration::ZERO,
            }
        }

        fn observe(&self) -> Observation<'_> {
            Observation {
                selection: &self.selection,
                progress: self.progress.state(),
                artifacts: self.artifacts,
                scanned_files: self.scanned_files,
                files_needing_work: self.files_needing_work,
                now: self.now,
            }
        }
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(RecommendationConfig::default(), Duration::ZERO)
    }

    #[test]
    fn test_no_crew_then_multi_language() {
        let mut fixture = Fixture::new();
        let mut engine = engine();

        let first = engine.on_selection_changed(&fixture.observe()).unwrap();
        assert_eq!(first.kind, RecommendationKind::WorkflowGuidance);
        assert_eq!(first.title, "No crew active");

        for language in ["Python", "Go", "Rust", "Java"] {
            fixture.selection.set_language(language, true).unwrap();
        }
        let second = engine.on_selection_changed(&fixture.observe()).unwrap();
        assert_eq!(second.kind, RecommendationKind::SecurityAdvice);
        assert_eq!(second.priority, Priority::Medium);

        fixture.selection.set_crew(CrewId::Documentation, true).unwrap();
        let third = engine.on_selection_changed(&fixture.observe()).unwrap();
        assert_eq!(third.kind, RecommendationKind::SecurityAdvice);
    }

    #[test]
    fn test_missing_improvement_crew() {
        let mut fixture = Fixture::new();
        let mut engine = engine();
        fixture.selection.set_crew(CrewId::SocialContent, true).unwrap();

        let rec = engine.on_selection_changed(&fixture.observe()).unwrap();
        assert_eq!(rec.kind, RecommendationKind::ImprovementAdvice);
        assert_eq!(
            rec.action.unwrap().command,
            RecommendationAction::ActivateCrew {
                crew: CrewId::CodeImprovement,
                agents: AgentSpan::All,
            }
        );

        fixture.selection.set_crew(CrewId::CodeImprovement, true).unwrap();
        assert!(engine.on_selection_changed(&fixture.observe()).is_none());
    }

    #[test]
    fn test_complexity_warning_in_configuration_only() {
        let mut fixture = Fixture::new();
        let mut engine = engine();
        for crew in CrewId::ALL {
            fixture.selection.set_crew(crew, true).unwrap();
        }
        fixture.selection.set_language("Python", true).unwrap();
        // 2*4 + 1.5 + 5 + 3 = 17.5

        let rec = engine.on_selection_changed(&fixture.observe()).unwrap();
        assert_eq!(rec.kind, RecommendationKind::ComplexityWarning);
        assert_eq!(engine.context().complexity_score(), 17.5);

        engine.on_stage_enter(Stage::Configuration, Stage::Results, &fixture.observe());
        assert!(engine.on_selection_changed(&fixture.observe()).is_none());
    }

    #[test]
    fn test_results_without_run() {
        let fixture = Fixture::new();
        let mut engine = engine();
        let rec = engine
            .on_stage_enter(Stage::Configuration, Stage::Results, &fixture.observe())
            .unwrap();
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(
            rec.action.unwrap().command,
            RecommendationAction::GoToStage {
                stage: Stage::Configuration
            }
        );
        assert_eq!(engine.context().stage(), Stage::Results);
    }

    #[test]
    fn test_running_analysis_suppresses_results_hint() {
        let mut fixture = Fixture::new();
        let mut engine = engine();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let mut rng = StdRng::seed_from_u64(1);
        let plan = AnalysisPlan::generate(&fixture.selection, &mut rng);
        fixture.progress.start(plan, &mut timers, &mut rng).unwrap();

        assert!(engine
            .on_stage_enter(Stage::Configuration, Stage::Results, &fixture.observe())
            .is_none());
    }

    #[test]
    fn test_improvement_transitions() {
        let mut fixture = Fixture::new();
        let mut engine = engine();

        fixture.artifacts = 4;
        let rec = engine
            .on_stage_enter(Stage::Results, Stage::Improvement, &fixture.observe())
            .unwrap();
        assert_eq!(rec.kind, RecommendationKind::CrossReference);
        assert!(rec.message.contains("4 files"));

        let rec = engine
            .on_stage_enter(Stage::Configuration, Stage::Improvement, &fixture.observe())
            .unwrap();
        assert_eq!(rec.kind, RecommendationKind::ActionNeeded);
        assert_eq!(rec.title, "Scan recommended");

        fixture.scanned_files = 10;
        fixture.files_needing_work = 3;
        let rec = engine
            .on_stage_enter(Stage::Configuration, Stage::Improvement, &fixture.observe())
            .unwrap();
        assert_eq!(rec.title, "Files need attention");
        assert_eq!(
            rec.action.unwrap().command,
            RecommendationAction::RevealQuickActions
        );

        fixture.files_needing_work = 0;
        assert!(engine
            .on_stage_enter(Stage::Configuration, Stage::Improvement, &fixture.observe())
            .is_none());
    }

    #[test]
    fn test_idle_session_engagement() {
        let mut fixture = Fixture::new();
        let mut engine = engine();
        fixture.selection.set_crew(CrewId::CodeImprovement, true).unwrap();
        engine.on_stage_enter(Stage::Configuration, Stage::Results, &fixture.observe());

        fixture.now = Duration::from_secs(301);
        let rec = engine.on_selection_changed(&fixture.observe()).unwrap();
        assert_eq!(rec.kind, RecommendationKind::Engagement);
        assert_eq!(rec.priority, Priority::Low);

        // Third action reaches the minimum.
        assert!(engine.on_selection_changed(&fixture.observe()).is_none());
        assert_eq!(engine.context().action_count(), 3);
    }

    #[test]
    fn test_history_is_bounded() {
        let fixture = Fixture::new();
        let config = RecommendationConfig {
            history_cap: 3,
            ..RecommendationConfig::default()
        };
        let mut engine = RecommendationEngine::new(config, Duration::ZERO);
        for _ in 0..5 {
            engine.on_selection_changed(&fixture.observe());
        }
        assert_eq!(engine.history().count(), 3);
        assert_eq!(engine.recent(2).len(), 2);
        assert_eq!(engine.recent(10).len(), 3);
    }

    #[test]
    fn test_record_question_once() {
        let mut engine = engine();
        assert!(engine.record_question(QuestionId::DocTarget));
        assert!(!engine.record_question(QuestionId::DocTarget));
        assert_eq!(engine.context().questions_asked().len(), 1);
    }
}
