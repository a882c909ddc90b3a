//! Polyforge - a multi-language build orchestrator
//!
//! This crate provides the core library functionality for Polyforge:
//! dependency-graph validation, layered build scheduling, per-language
//! compilation plugins, cross-compilation toolchain resolution, interface
//! extraction, and foreign-binding generation.

pub mod build;
pub mod core;
pub mod error;
pub mod extract;
pub mod glue;
pub mod graph;
pub mod plugin;
pub mod toolchain;
pub mod util;

pub use core::interface::InterfaceDescription;
pub use core::module::{BuildProfile, ModuleConfig, ModuleName};
pub use core::project::ProjectConfig;
pub use core::target::CrossTarget;

pub use build::{BuildOptions, BuildReport, Orchestrator};
pub use error::BuildError;
pub use glue::GlueCodeResult;
pub use graph::{BuildSchedule, ProjectGraph};
pub use plugin::{CompileResult, LanguagePlugin, PluginRegistry};
pub use toolchain::{ToolchainDescriptor, ToolchainResolver};
