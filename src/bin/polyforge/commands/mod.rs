//! Command implementations

pub mod build;
pub mod extract;
pub mod glue;
pub mod graph;
pub mod targets;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use polyforge::core::project::MANIFEST_NAME;
use polyforge::ProjectConfig;

/// Locate the manifest: an explicit path wins, otherwise search upward
/// from the current directory.
pub fn find_manifest(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("manifest not found at {}", path.display());
        }
        return Ok(path.to_path_buf());
    }

    let mut dir = std::env::current_dir()?;
    loop {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            bail!("no {MANIFEST_NAME} found in this directory or any parent");
        }
    }
}

/// Load and validate a project, returning the config and its root.
pub fn load_project(explicit: Option<&Path>) -> Result<(ProjectConfig, PathBuf)> {
    let manifest = find_manifest(explicit)?;
    let root = manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = ProjectConfig::load(&manifest)?;
    Ok((config, root))
}
