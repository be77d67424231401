use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ParserError, Result};

/// Configuration for the artifact parser and merge engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    /// Tag names recognised as the outer envelope
    pub artifact_tags: Vec<String>,

    /// Tag names recognised as action directives inside the envelope
    pub action_tags: Vec<String>,

    /// Artifact id used when the envelope has no `id` attribute
    pub default_artifact_id: String,

    /// Title used when the envelope has no `title` attribute
    pub default_title: String,

    /// Globs for files injected wholesale rather than generated.
    /// These render complete immediately instead of streaming in.
    pub boilerplate_paths: Vec<String>,

    /// Globs for boilerplate files that later AI turns may not overwrite.
    /// Empty means the latest write always wins.
    pub protected_paths: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            artifact_tags: vec!["forgeArtifact".to_string(), "artifact".to_string()],
            action_tags: vec!["forgeAction".to_string(), "action".to_string()],
            default_artifact_id: "unknown".to_string(),
            default_title: "Untitled Project".to_string(),
            boilerplate_paths: [
                "package.json",
                "tsconfig.json",
                "next-env.d.ts",
                "next.config.*",
                "postcss.config.*",
                "tailwind.config.*",
                ".eslintrc*",
                "src/app/layout.tsx",
                "src/app/globals.css",
                "src/components/wallet/**",
            ]
            .iter()
            .map(|p| (*p).to_string())
            .collect(),
            protected_paths: Vec::new(),
        }
    }
}

impl ParserConfig {
    /// Default config that additionally refuses AI overrides of the
    /// essential build configuration shipped with the boilerplate
    pub fn strict_boilerplate() -> Self {
        Self {
            protected_paths: [
                "tsconfig.json",
                "next.config.*",
                "postcss.config.*",
                "tailwind.config.*",
            ]
            .iter()
            .map(|p| (*p).to_string())
            .collect(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_tags("artifact_tags", &self.artifact_tags)?;
        validate_tags("action_tags", &self.action_tags)?;

        if let Some(tag) = self
            .artifact_tags
            .iter()
            .find(|tag| self.action_tags.contains(tag))
        {
            return Err(ParserError::invalid_config(format!(
                "tag `{tag}` cannot be both an artifact and an action tag"
            )));
        }

        if self.default_artifact_id.trim().is_empty() {
            return Err(ParserError::invalid_config(
                "default_artifact_id must not be empty",
            ));
        }

        crate::policy::PathPolicy::from_config(self)?;
        Ok(())
    }
}

fn validate_tags(field: &str, tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        return Err(ParserError::invalid_config(format!(
            "{field} must name at least one tag"
        )));
    }

    for tag in tags {
        let mut chars = tag.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ':');
        if !starts_alpha || !rest_ok {
            return Err(ParserError::invalid_config(format!(
                "{field} contains invalid tag name `{tag}`"
            )));
        }
    }

    Ok(())
}
