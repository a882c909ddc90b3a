//! Core data model: modules, projects, targets, and interface descriptions.

pub mod interface;
pub mod module;
pub mod project;
pub mod target;

pub use interface::{ExportedFunction, InterfaceDescription, Parameter, PrimitiveType};
pub use module::{BuildProfile, ModuleConfig, ModuleName};
pub use project::ProjectConfig;
pub use target::{Abi, Arch, CrossTarget, Os};
