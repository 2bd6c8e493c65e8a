//! Tunable constants for the simulation, recommendation and notification layers.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed seed for reproducible sessions; entropy-seeded when absent.
    pub seed: Option<u64>,
    pub progress: ProgressConfig,
    pub notifications: NotificationConfig,
    pub selection: SelectionConfig,
    pub recommendations: RecommendationConfig,
    pub scan_delay_ms: u64,
    pub quick_action_delay_ms: u64,
    pub modification_history_cap: usize,
    pub summary_interval_ms: u64,
    pub auto_demo: AutoDemoConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            progress: ProgressConfig::default(),
            notifications: NotificationConfig::default(),
            selection: SelectionConfig::default(),
            recommendations: RecommendationConfig::default(),
            scan_delay_ms: 1000,
            quick_action_delay_ms: 1500,
            modification_history_cap: 20,
            summary_interval_ms: 30_000,
            auto_demo: AutoDemoConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.progress.validate()?;
        if self.summary_interval_ms == 0 {
            return Err(EngineError::Config(
                "summary_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn quick_action_delay(&self) -> Duration {
        Duration::from_millis(self.quick_action_delay_ms)
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_millis(self.summary_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub increment_min: u8,
    pub increment_max: u8,
    pub tick_delay_min_ms: u64,
    pub tick_delay_max_ms: u64,
    pub steps: Vec<String>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            increment_min: 3,
            increment_max: 8,
            tick_delay_min_ms: 200,
            tick_delay_max_ms: 600,
            steps: [
                "Scanning project files",
                "Analyzing detected languages",
                "Configuring AI agents",
                "Generating documentation",
                "Analyzing code and improvements",
                "Running security scan",
                "Creating social content",
                "Finalizing report",
            ]
            .iter()
            .map(|step| step.to_string())
            .collect(),
        }
    }
}

impl ProgressConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.increment_min == 0 || self.increment_min > self.increment_max {
            return Err(EngineError::Config(format!(
                "invalid progress increment range {}..={}",
                self.increment_min, self.increment_max
            )));
        }
        if self.increment_max > 100 {
            return Err(EngineError::Config(
                "progress increment cannot exceed 100".to_string(),
            ));
        }
        if self.tick_delay_min_ms > self.tick_delay_max_ms {
            return Err(EngineError::Config(format!(
                "invalid tick delay range {}..={} ms",
                self.tick_delay_min_ms, self.tick_delay_max_ms
            )));
        }
        if self.steps.is_empty() || self.steps.len() > 100 {
            return Err(EngineError::Config(
                "analysis needs between 1 and 100 steps".to_string(),
            ));
        }
        Ok(())
    }

    pub fn increments(&self) -> RangeInclusive<u8> {
        self.increment_min..=self.increment_max
    }

    pub fn tick_delays(&self) -> RangeInclusive<u64> {
        self.tick_delay_min_ms..=self.tick_delay_max_ms
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub duration_ms: u64,
    /// Lifetime of confirmation notices such as "crew activated".
    pub confirmation_ms: u64,
    pub demo_step_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            confirmation_ms: 3000,
            demo_step_ms: 2000,
        }
    }
}

impl NotificationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }

    pub fn demo_step(&self) -> Duration {
        Duration::from_millis(self.demo_step_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub cooldown_ms: u64,
    pub reaction_delay_ms: u64,
    /// Pick random crews and languages when an analysis starts with an empty selection.
    pub autofill_empty_selection: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 3000,
            reaction_delay_ms: 1000,
            autofill_empty_selection: true,
        }
    }
}

impl SelectionConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn reaction_delay(&self) -> Duration {
        Duration::from_millis(self.reaction_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub idle_session_secs: u64,
    pub min_actions: u64,
    pub complexity_threshold: f64,
    pub multi_language_threshold: usize,
    pub improvement_hint_artifacts: usize,
    pub history_cap: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            idle_session_secs: 300,
            min_actions: 3,
            complexity_threshold: 15.0,
            multi_language_threshold: 3,
            improvement_hint_artifacts: 5,
            history_cap: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoDemoConfig {
    pub start_delay_ms: u64,
    pub step_delay_ms: u64,
}

impl Default for AutoDemoConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 2000,
            step_delay_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.progress.steps.len(), 8);
        assert_eq!(config.notifications.duration(), Duration::from_secs(10));
        assert_eq!(config.selection.cooldown(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: EngineConfig =
            serde_yaml::from_str("seed: 7\nprogress:\n  increment_max: 10\n").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.progress.increment_min, 3);
        assert_eq!(config.progress.increment_max, 10);
        assert_eq!(config.recommendations.min_actions, 3);
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut config = EngineConfig::default();
        config.progress.increment_min = 9;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let mut config = EngineConfig::default();
        config.progress.tick_delay_min_ms = 700;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.progress.steps.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_increment() {
        let mut config = EngineConfig::default();
        config.progress.increment_min = 0;
        assert!(config.validate().is_err());
    }
}
