//! Dependency analysis and build scheduling.

pub mod analyzer;
pub mod schedule;

pub use analyzer::ProjectGraph;
pub use schedule::BuildSchedule;
