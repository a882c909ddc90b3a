//! Language plugin contract and registry.
//!
//! Each supported language implements [`LanguagePlugin`] once; the registry
//! maps case-insensitive language identifiers to plugin instances. A later
//! registration for the same identifier replaces the earlier one, which is
//! how a built-in gets overridden.

pub mod dlang;
pub mod native;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::core::interface::InterfaceDescription;
use crate::core::module::{BuildProfile, ModuleConfig};
use crate::core::target::CrossTarget;
use crate::error::BuildError;
use crate::glue::GlueCodeResult;
use crate::toolchain::ToolchainDescriptor;

pub use dlang::DlangPlugin;
pub use native::NativePlugin;

/// What a plugin can do beyond compiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub compile: bool,
    pub extract: bool,
    pub glue: bool,
}

impl Capabilities {
    /// The full capability set.
    pub fn full() -> Self {
        Capabilities {
            compile: true,
            extract: true,
            glue: true,
        }
    }
}

/// Everything a plugin needs for one module compile.
pub struct CompileRequest<'a> {
    pub module: &'a ModuleConfig,
    pub profile: BuildProfile,
    pub target: CrossTarget,
    /// Toolchain resolved for `target` by the orchestrator.
    pub toolchain: &'a ToolchainDescriptor,
}

/// Outcome of one module compile.
///
/// A result never carries both artifacts and an error.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub success: bool,
    /// Paths of produced artifacts; empty on failure.
    pub artifacts: Vec<PathBuf>,
    /// Captured toolchain output, in order.
    pub logs: Vec<String>,
    pub elapsed: Duration,
    /// Structured failure, present exactly when `success` is false.
    pub error: Option<BuildError>,
}

impl CompileResult {
    /// A successful compile.
    pub fn success(artifacts: Vec<PathBuf>, logs: Vec<String>, elapsed: Duration) -> Self {
        CompileResult {
            success: true,
            artifacts,
            logs,
            elapsed,
            error: None,
        }
    }

    /// A failed compile, with preserved logs.
    pub fn failure(error: BuildError, logs: Vec<String>, elapsed: Duration) -> Self {
        CompileResult {
            success: false,
            artifacts: Vec::new(),
            logs,
            elapsed,
            error: Some(error),
        }
    }
}

/// The per-language capability contract.
pub trait LanguagePlugin: Send + Sync {
    /// Canonical lowercase language identifier.
    fn language(&self) -> &str;

    /// Capability query.
    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    /// Check whether this plugin's toolchain can build for the request's
    /// target, returning availability plus a human-readable message.
    fn validate_toolchain(&self, toolchain: &ToolchainDescriptor) -> (bool, String);

    /// Compile one module. Failures are data, not panics.
    fn compile(&self, request: &CompileRequest<'_>) -> CompileResult;

    /// Extract the exported-function interface from a compiled artifact.
    ///
    /// Unrecognized content yields zero exports; an `Err` is reserved for an
    /// unreadable artifact.
    fn extract_interface(&self, artifact: &Path) -> Result<InterfaceDescription, BuildError>;

    /// Generate foreign-binding source for `target_language`.
    fn generate_glue(
        &self,
        interface: &InterfaceDescription,
        target_language: &str,
    ) -> Result<GlueCodeResult, BuildError> {
        crate::glue::generate(interface, target_language)
    }
}

impl std::fmt::Debug for dyn LanguagePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguagePlugin")
            .field("language", &self.language())
            .finish()
    }
}

/// Registry of language plugins, keyed case-insensitively.
///
/// Read-mostly: populated before builds, only queried while layers run.
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn LanguagePlugin>>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        PluginRegistry {
            plugins: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in languages.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NativePlugin::c()));
        registry.register(Arc::new(NativePlugin::cpp()));
        registry.register(Arc::new(DlangPlugin::new()));
        registry
    }

    /// Register a plugin, replacing any earlier one for the same language.
    pub fn register(&mut self, plugin: Arc<dyn LanguagePlugin>) {
        let key = plugin.language().to_lowercase();
        if self.plugins.insert(key, plugin).is_some() {
            tracing::debug!("replaced existing plugin registration");
        }
    }

    /// Look up a plugin; absence is data, not a crash.
    pub fn get(&self, language: &str) -> Option<Arc<dyn LanguagePlugin>> {
        self.plugins.get(&language.to_lowercase()).cloned()
    }

    /// Look up a plugin, mapping absence to `PluginNotFound`.
    pub fn lookup(&self, language: &str) -> Result<Arc<dyn LanguagePlugin>, BuildError> {
        self.get(language).ok_or_else(|| BuildError::PluginNotFound {
            language: language.to_string(),
        })
    }

    /// Registered language identifiers, sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.plugins.keys().cloned().collect();
        langs.sort();
        langs
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
