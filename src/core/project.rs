//! Project manifest loading.
//!
//! A project is described by a `Forge.toml` manifest listing its modules,
//! their languages, and their inter-module dependencies.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::module::{ModuleConfig, ModuleName};
use crate::error::BuildError;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Forge.toml";

/// Top-level shape of `Forge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSection>,
}

/// The `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// One `[[module]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSection {
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub source: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load and validate a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = crate::util::fs::read_to_string(path)?;
        let config: ProjectConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation, before any graph analysis.
    ///
    /// Dependency existence is the analyzer's job; this only checks that the
    /// manifest itself is well-formed.
    fn validate(&self) -> Result<(), BuildError> {
        let mut seen: HashSet<ModuleName> = HashSet::new();

        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(BuildError::ConfigInvalid {
                    reason: "module with empty name".to_string(),
                });
            }
            if module.language.trim().is_empty() {
                return Err(BuildError::ConfigInvalid {
                    reason: format!("module `{}` has empty language", module.name),
                });
            }
            // Names are case-insensitive, so `Core` and `core` collide.
            if !seen.insert(ModuleName::new(&module.name)) {
                return Err(BuildError::ConfigInvalid {
                    reason: format!("duplicate module name `{}`", module.name),
                });
            }
        }

        Ok(())
    }

    /// Convert manifest entries into [`ModuleConfig`] values in declaration
    /// order, resolving source paths relative to `root`.
    pub fn into_modules(self, root: &Path) -> Vec<ModuleConfig> {
        let default_output = root.join("build");

        self.modules
            .into_iter()
            .map(|m| ModuleConfig {
                name: ModuleName::new(m.name),
                language: m.language.to_lowercase(),
                dependencies: m.dependencies.into_iter().map(ModuleName::new).collect(),
                source_path: root.join(m.source),
                output_dir: m
                    .output
                    .map(|o| root.join(o))
                    .unwrap_or_else(|| default_output.clone()),
            })
            .collect()
    }
}

impl std::str::FromStr for ProjectConfig {
    type Err = BuildError;

    /// Parse and validate a manifest from a string.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let config: ProjectConfig =
            toml::from_str(text).map_err(|e| BuildError::ConfigInvalid {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}
