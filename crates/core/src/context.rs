use crate::dialogue::QuestionId;
use crate::selection::SelectionModel;
use crate::types::{CrewId, Stage};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// `2*crews + 1.5*languages + 5*security + 3*documentation`.
pub fn complexity_score(
    active_crews: usize,
    languages: usize,
    has_security: bool,
    has_documentation: bool,
) -> f64 {
    let security = if has_security { 5.0 } else { 0.0 };
    let documentation = if has_documentation { 3.0 } else { 0.0 };
    2.0 * active_crews as f64 + 1.5 * languages as f64 + security + documentation
}

/// Rolling view of the session, owned and mutated by the recommendation engine.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub(crate) stage: Stage,
    pub(crate) started_at: Duration,
    pub(crate) action_count: u64,
    pub(crate) questions_asked: BTreeSet<QuestionId>,
    pub(crate) complexity_score: f64,
}

impl SessionContext {
    pub fn new(started_at: Duration) -> Self {
        Self {
            stage: Stage::Configuration,
            started_at,
            action_count: 0,
            questions_asked: BTreeSet::new(),
            complexity_score: 0.0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn questions_asked(&self) -> &BTreeSet<QuestionId> {
        &self.questions_asked
    }

    pub fn complexity_score(&self) -> f64 {
        self.complexity_score
    }

    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }

    pub(crate) fn update(&mut self, selection: &SelectionModel) {
        self.complexity_score = complexity_score(
            selection.active_crew_count(),
            selection.language_count(),
            selection.is_crew_active(CrewId::Security),
            selection.is_crew_active(CrewId::Documentation),
        );
        self.action_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_complexity_formula() {
        assert_eq!(complexity_score(2, 3, true, true), 16.5);
        assert_eq!(complexity_score(0, 0, false, false), 0.0);
        assert_eq!(complexity_score(1, 4, false, false), 8.0);
    }

    #[test]
    fn test_update_counts_actions() {
        let mut selection = SelectionModel::new(Catalog::default()).unwrap();
        selection.set_crew(CrewId::Security, true).unwrap();
        selection.set_crew(CrewId::Documentation, true).unwrap();
        for language in ["Python", "Go", "Rust"] {
            selection.set_language(language, true).unwrap();
        }

        let mut context = SessionContext::new(Duration::from_secs(5));
        context.update(&selection);
        context.update(&selection);

        assert_eq!(context.complexity_score(), 16.5);
        assert_eq!(context.action_count(), 2);
        assert_eq!(context.age(Duration::from_secs(65)), Duration::from_secs(60));
        assert_eq!(context.age(Duration::ZERO), Duration::ZERO);
    }
}
