//! Crew/agent toggles and the language selection.

use crate::catalog::{Catalog, CrewDefinition};
use crate::error::EngineError;
use crate::types::{AgentSpan, CrewId};
use rand::seq::{index, SliceRandom};
use rand::{Rng, RngCore};
use serde::Serialize;
use std::collections::BTreeSet;

const WEB_STACK: [&str; 4] = ["Python", "JavaScript", "HTML", "CSS"];
const CATCH_ALL_LANGUAGE: &str = "Other";

struct CrewState {
    definition: CrewDefinition,
    active: Vec<bool>,
}

impl CrewState {
    fn active_count(&self) -> usize {
        self.active.iter().filter(|on| **on).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewSummary {
    pub crew: CrewId,
    pub label: String,
    pub active_agents: Vec<String>,
}

/// Crews keep their catalog order and their agent membership for the whole session;
/// only the boolean state of each agent changes.
pub struct SelectionModel {
    crews: Vec<CrewState>,
    languages: Vec<String>,
    selected_languages: BTreeSet<usize>,
}

impl SelectionModel {
    pub fn new(catalog: Catalog) -> Result<Self, EngineError> {
        catalog.validate()?;
        let crews = catalog
            .crews
            .into_iter()
            .map(|definition| CrewState {
                active: vec![false; definition.agents.len()],
                definition,
            })
            .collect();
        Ok(Self {
            crews,
            languages: catalog.languages,
            selected_languages: BTreeSet::new(),
        })
    }

    pub fn crews(&self) -> impl Iterator<Item = &CrewDefinition> {
        self.crews.iter().map(|state| &state.definition)
    }

    pub fn crew_label(&self, crew: CrewId) -> Option<&str> {
        self.state(crew).ok().map(|state| state.definition.label.as_str())
    }

    fn state(&self, crew: CrewId) -> Result<&CrewState, EngineError> {
        self.crews
            .iter()
            .find(|state| state.definition.id == crew)
            .ok_or_else(|| EngineError::UnknownCrew(crew.to_string()))
    }

    fn state_mut(&mut self, crew: CrewId) -> Result<&mut CrewState, EngineError> {
        self.crews
            .iter_mut()
            .find(|state| state.definition.id == crew)
            .ok_or_else(|| EngineError::UnknownCrew(crew.to_string()))
    }

    /// Toggle one agent by name. Returns the crew's new active count.
    pub fn set_agent(&mut self, crew: CrewId, agent: &str, value: bool) -> Result<usize, EngineError> {
        let state = self.state_mut(crew)?;
        let position = state
            .definition
            .agents
            .iter()
            .position(|candidate| candidate.name.eq_ignore_ascii_case(agent))
            .ok_or_else(|| EngineError::UnknownAgent {
                crew,
                agent: agent.to_string(),
            })?;
        state.active[position] = value;
        Ok(state.active_count())
    }

    /// Toggle one agent by its position in the crew definition.
    pub fn set_agent_at(&mut self, crew: CrewId, index: usize, value: bool) -> Result<usize, EngineError> {
        let state = self.state_mut(crew)?;
        let slot = state
            .active
            .get_mut(index)
            .ok_or_else(|| EngineError::UnknownAgent {
                crew,
                agent: format!("#{}", index),
            })?;
        *slot = value;
        Ok(state.active_count())
    }

    pub fn set_crew(&mut self, crew: CrewId, value: bool) -> Result<usize, EngineError> {
        let state = self.state_mut(crew)?;
        state.active.iter_mut().for_each(|slot| *slot = value);
        Ok(state.active_count())
    }

    /// Switch on the agents covered by `span`, leaving the others untouched.
    pub fn activate(&mut self, crew: CrewId, span: AgentSpan) -> Result<usize, EngineError> {
        let state = self.state_mut(crew)?;
        let limit = match span {
            AgentSpan::All => state.active.len(),
            AgentSpan::First(n) => n.min(state.active.len()),
        };
        state.active[..limit].iter_mut().for_each(|slot| *slot = true);
        Ok(state.active_count())
    }

    pub fn active_count(&self, crew: CrewId) -> usize {
        self.state(crew).map(CrewState::active_count).unwrap_or(0)
    }

    pub fn is_crew_active(&self, crew: CrewId) -> bool {
        self.active_count(crew) > 0
    }

    pub fn active_crew_count(&self) -> usize {
        self.crews.iter().filter(|state| state.active_count() > 0).count()
    }

    pub fn active_agent_total(&self) -> usize {
        self.crews.iter().map(CrewState::active_count).sum()
    }

    pub fn active_crews(&self) -> Vec<CrewSummary> {
        self.crews
            .iter()
            .filter(|state| state.active_count() > 0)
            .map(|state| CrewSummary {
                crew: state.definition.id,
                label: state.definition.label.clone(),
                active_agents: state
                    .definition
                    .agents
                    .iter()
                    .zip(&state.active)
                    .filter(|(_, on)| **on)
                    .map(|(agent, _)| agent.name.clone())
                    .collect(),
            })
            .collect()
    }

    /// Returns the number of selected languages after the change.
    pub fn set_language(&mut self, language: &str, value: bool) -> Result<usize, EngineError> {
        let position = self
            .languages
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(language))
            .ok_or_else(|| EngineError::UnknownLanguage(language.to_string()))?;
        if value {
            self.selected_languages.insert(position);
        } else {
            self.selected_languages.remove(&position);
        }
        Ok(self.selected_languages.len())
    }

    /// Selected languages in catalog order.
    pub fn active_languages(&self) -> Vec<&str> {
        self.selected_languages
            .iter()
            .map(|position| self.languages[*position].as_str())
            .collect()
    }

    pub fn language_count(&self) -> usize {
        self.selected_languages.len()
    }

    /// Reset every crew, then switch on one to three random agents in each.
    pub fn randomize_crews(&mut self, rng: &mut dyn RngCore) {
        for state in &mut self.crews {
            let len = state.active.len();
            let amount = rng.gen_range(1..=3).min(len);
            state.active.iter_mut().for_each(|slot| *slot = false);
            for position in index::sample(rng, len, amount).into_iter() {
                state.active[position] = true;
            }
        }
    }

    /// Replace the language selection with a simulated detection result.
    ///
    /// With a project folder the fixed web stack is selected; without one, two to six
    /// random languages (never the catch-all entry).
    pub fn detect_languages(&mut self, rng: &mut dyn RngCore, has_project_folder: bool) -> Vec<String> {
        self.selected_languages.clear();

        let picked: Vec<usize> = if has_project_folder {
            WEB_STACK
                .iter()
                .filter_map(|name| self.languages.iter().position(|candidate| candidate == name))
                .collect()
        } else {
            let pool: Vec<usize> = (0..self.languages.len())
                .filter(|position| self.languages[*position] != CATCH_ALL_LANGUAGE)
                .collect();
            let amount = rng.gen_range(2..=6).min(pool.len());
            pool.choose_multiple(rng, amount).copied().collect()
        };

        self.selected_languages.extend(picked);
        self.active_languages()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
