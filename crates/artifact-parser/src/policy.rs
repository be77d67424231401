use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::ParserConfig;
use crate::error::{ParserError, Result};
use crate::paths;

/// Compiled path classification rules
#[derive(Debug, Clone)]
pub struct PathPolicy {
    boilerplate: GlobSet,
    protected: GlobSet,
}

impl PathPolicy {
    pub fn from_config(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            boilerplate: build_globset(&config.boilerplate_paths)?,
            protected: build_globset(&config.protected_paths)?,
        })
    }

    /// Whether `path` is injected wholesale rather than generated
    pub fn is_boilerplate(&self, path: &str) -> bool {
        self.boilerplate.is_match(paths::normalize_path(path))
    }

    /// Whether an AI layer is forbidden from replacing `path`
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.is_match(paths::normalize_path(path))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ParserError::invalid_pattern(pattern, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ParserError::invalid_pattern(patterns.join(", "), e))
}
