//! Crew and language catalogs.

use crate::error::EngineError;
use crate::types::CrewId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewDefinition {
    pub id: CrewId,
    pub label: String,
    pub agents: Vec<AgentDefinition>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    crews: Vec<CrewDefinition>,
    #[serde(default)]
    languages: Vec<String>,
}

/// Crew definitions plus the selectable languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub crews: Vec<CrewDefinition>,
    pub languages: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            crews: default_crews(),
            languages: default_languages(),
        }
    }
}

impl Catalog {
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for crew in &self.crews {
            if !seen.insert(crew.id) {
                return Err(EngineError::DuplicateCrew(crew.id));
            }
            if crew.agents.is_empty() {
                return Err(EngineError::EmptyCrew(crew.id));
            }
        }
        if self.languages.is_empty() {
            return Err(EngineError::Config("language catalog is empty".to_string()));
        }
        Ok(())
    }
}

/// Load a crew catalog from YAML. Languages fall back to the built-in list when omitted.
pub fn load_crew_catalog(path: impl AsRef<Path>) -> Result<Catalog, EngineError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EngineError::Config(format!(
            "Catalog file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let raw: RawCatalog = serde_yaml::from_str(&content)
        .map_err(|e| EngineError::Config(format!("Invalid catalog YAML: {}", e)))?;

    let catalog = Catalog {
        crews: raw.crews,
        languages: if raw.languages.is_empty() {
            default_languages()
        } else {
            raw.languages
        },
    };
    catalog.validate()?;
    tracing::debug!(
        "Loaded catalog with {} crews and {} languages",
        catalog.crews.len(),
        catalog.languages.len()
    );
    Ok(catalog)
}

fn crew(id: CrewId, label: &str, agents: &[(&str, &str)]) -> CrewDefinition {
    CrewDefinition {
        id,
        label: label.to_string(),
        agents: agents
            .iter()
            .map(|(name, description)| AgentDefinition {
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect(),
    }
}

pub fn default_crews() -> Vec<CrewDefinition> {
    vec![
        crew(
            CrewId::Documentation,
            "📚 Documentation Crew",
            &[
                ("README generator", "Full project documentation from the source tree"),
                ("API reference", "Technical docs for APIs and modules"),
                ("Install guides", "Per-platform setup instructions"),
            ],
        ),
        crew(
            CrewId::CodeImprovement,
            "🔧 Code Improvement Crew",
            &[
                ("Code review", "Comments and optimization hints"),
                ("Quality standards", "Conventions such as PEP 8 or ESLint"),
                ("Refactoring", "Structural improvement suggestions"),
            ],
        ),
        crew(
            CrewId::Security,
            "🔒 Security Crew",
            &[
                ("Security scan", "Vulnerability and secret detection"),
                ("Secrets management", "Move secrets to .env and environment variables"),
                ("Hardened config", ".gitignore and security policy files"),
            ],
        ),
        crew(
            CrewId::SocialContent,
            "📱 Social Content Crew",
            &[
                ("LinkedIn posts", "Professional posts presenting the project"),
                ("GitHub descriptions", "Repository description tuning"),
                ("Marketing docs", "Promotional content and use cases"),
            ],
        ),
    ]
}

pub fn default_languages() -> Vec<String> {
    [
        "Python", "JavaScript", "TypeScript", "Java", "C#", "C++", "C", "Go", "Rust", "PHP",
        "Ruby", "Swift", "Kotlin", "Scala", "R", "MATLAB", "Perl", "Shell", "PowerShell", "HTML",
        "CSS", "SQL", "Assembly", "Objective-C", "Dart", "Lua", "Haskell", "Clojure", "F#",
        "VB.NET", "COBOL", "Fortran", "Other",
    ]
    .iter()
    .map(|language| language.to_string())
    .collect()
}
