use anyhow::{Context, Result};
use crewflow_core::{load_crew_catalog, Catalog, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "crewflow.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub event_format: EventFormat,
    /// YAML crew catalog; the built-in crews are used when unset.
    pub catalog_path: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            event_format: EventFormat::Text,
            catalog_path: None,
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `crewflow.toml` from the working directory, or defaults when it is absent.
    pub fn load() -> Result<Self> {
        if !Path::new(CONFIG_FILE).exists() {
            return Ok(Self::default());
        }
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("Invalid engine configuration")
    }

    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => load_crew_catalog(path)
                .with_context(|| format!("Failed to load crew catalog {}", path.display())),
            None => Ok(Catalog::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "log_level = \"debug\"\n\n[engine]\nseed = 5\n\n[engine.notifications]\nduration_ms = 4000\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.event_format, EventFormat::Text);
        assert_eq!(config.engine.seed, Some(5));
        assert_eq!(config.engine.notifications.duration_ms, 4000);
        assert_eq!(config.engine.selection.cooldown_ms, 3000);
    }

    #[test]
    fn test_serialized_config_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        let config = AppConfig {
            event_format: EventFormat::Json,
            ..AppConfig::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.event_format, EventFormat::Json);
        assert_eq!(loaded.engine.summary_interval_ms, 30_000);
    }

    #[test]
    fn test_invalid_progress_range_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[engine.progress]\nincrement_min = 9\nincrement_max = 2\n").unwrap();

        let error = AppConfig::load_from(&path).unwrap_err();
        assert!(format!("{:#}", error).contains("invalid progress increment range"));
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = AppConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/crews.yaml")),
            ..AppConfig::default()
        };
        assert!(config.catalog().is_err());
        assert_eq!(AppConfig::default().catalog().unwrap().crews.len(), 4);
    }
}
