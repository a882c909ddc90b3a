//! Build error types.
//!
//! Every error carries a stable code (for machine consumption) plus a
//! human-readable detail. Graph and configuration errors abort before any
//! compilation; compile-time errors preserve the results already produced.

use thiserror::Error;

/// Error produced by the orchestration core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid project configuration: {reason}")]
    ConfigInvalid { reason: String },

    #[error("module `{referrer}` depends on unknown module `{missing}`")]
    DependencyNotFound { missing: String, referrer: String },

    #[error("circular dependency: {}", chain.join(" -> "))]
    CircularDependency {
        /// Cycle chain; consecutive pairs are declared edges and the first
        /// name equals the last, closing the loop.
        chain: Vec<String>,
    },

    #[error("module not found: `{module}`")]
    ModuleNotFound { module: String },

    #[error("no plugin registered for language `{language}`")]
    PluginNotFound { language: String },

    #[error("toolchain unavailable for `{target}`: {reason}")]
    ToolchainUnavailable { target: String, reason: String },

    #[error("compilation failed for module `{module}`: {detail}")]
    CompileFailed { module: String, detail: String },

    #[error("linking failed for module `{module}`: {detail}")]
    LinkFailed { module: String, detail: String },

    #[error("interface extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    #[error("glue generation does not support target language `{language}`")]
    GlueUnsupportedTarget { language: String },
}

impl BuildError {
    /// Stable error code, independent of the display message.
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::ConfigInvalid { .. } => "config-invalid",
            BuildError::DependencyNotFound { .. } => "dependency-not-found",
            BuildError::CircularDependency { .. } => "circular-dependency",
            BuildError::ModuleNotFound { .. } => "module-not-found",
            BuildError::PluginNotFound { .. } => "plugin-not-found",
            BuildError::ToolchainUnavailable { .. } => "toolchain-unavailable",
            BuildError::CompileFailed { .. } => "compile-failed",
            BuildError::LinkFailed { .. } => "link-failed",
            BuildError::ExtractionFailed { .. } => "extraction-failed",
            BuildError::GlueUnsupportedTarget { .. } => "glue-unsupported-target",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_joins_chain() {
        let err = BuildError::CircularDependency {
            chain: vec!["x".to_string(), "y".to_string(), "x".to_string()],
        };

        assert_eq!(err.to_string(), "circular dependency: x -> y -> x");
        assert_eq!(err.code(), "circular-dependency");
    }

    #[test]
    fn test_dependency_not_found_names_both_sides() {
        let err = BuildError::DependencyNotFound {
            missing: "mathlib".to_string(),
            referrer: "app".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("mathlib"));
        assert!(msg.contains("app"));
    }
}
