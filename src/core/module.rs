//! Module identity and configuration.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A module name.
///
/// Names compare and hash case-insensitively while preserving the declared
/// spelling for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a new module name.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleName(name.into())
    }

    /// The declared spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for identity.
    fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for ModuleName {
    fn eq(&self, other: &Self) -> bool {
        self.folded() == other.folded()
    }
}

impl Eq for ModuleName {}

impl Hash for ModuleName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state);
    }
}

impl PartialOrd for ModuleName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.folded().cmp(&other.folded())
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        ModuleName::new(s)
    }
}

/// Compile profile passed through to language plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    /// Unoptimized, with debug info.
    #[default]
    Debug,
    /// Optimized for release.
    Release,
}

impl BuildProfile {
    /// Get the profile name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildProfile::Debug => "debug",
            BuildProfile::Release => "release",
        }
    }
}

/// Configuration for a single module.
///
/// Immutable once parsed from the project manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module name, unique within the project.
    pub name: ModuleName,
    /// Language identifier, resolved through the plugin registry.
    pub language: String,
    /// Names of modules this module depends on, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<ModuleName>,
    /// Directory containing the module's sources.
    pub source_path: PathBuf,
    /// Output directory for compiled artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

impl ModuleConfig {
    /// Create a module config with no dependencies.
    pub fn new(
        name: impl Into<ModuleName>,
        language: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        ModuleConfig {
            name: name.into(),
            language: language.into(),
            dependencies: Vec::new(),
            source_path: source_path.into(),
            output_dir: default_output_dir(),
        }
    }

    /// Add a dependency, builder-style.
    pub fn with_dependency(mut self, dep: impl Into<ModuleName>) -> Self {
        self.dependencies.push(dep.into());
        self
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        ModuleName::new(s)
    }
}
