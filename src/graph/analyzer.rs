//! Dependency graph validation and cycle detection.

use std::collections::HashMap;

use crate::core::module::{ModuleConfig, ModuleName};
use crate::error::BuildError;

/// A validated project dependency graph.
///
/// Modules live in an index-addressed arena in declaration order; edges are
/// dependency indices into the same arena. Construction guarantees every
/// dependency resolves and the graph is acyclic.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    modules: Vec<ModuleConfig>,
    index: HashMap<ModuleName, usize>,
    edges: Vec<Vec<usize>>,
}

/// DFS marking state.
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl ProjectGraph {
    /// Validate a module set and build its dependency graph.
    ///
    /// Fails fast on the first missing dependency; no partial graph is
    /// produced. An empty module set yields an empty graph.
    pub fn analyze(modules: Vec<ModuleConfig>) -> Result<Self, BuildError> {
        let mut index = HashMap::with_capacity(modules.len());
        for (i, module) in modules.iter().enumerate() {
            if index.insert(module.name.clone(), i).is_some() {
                return Err(BuildError::ConfigInvalid {
                    reason: format!("duplicate module name `{}`", module.name),
                });
            }
        }

        let mut edges = Vec::with_capacity(modules.len());
        for module in &modules {
            let mut deps = Vec::with_capacity(module.dependencies.len());
            for dep in &module.dependencies {
                let Some(&target) = index.get(dep) else {
                    return Err(BuildError::DependencyNotFound {
                        missing: dep.to_string(),
                        referrer: module.name.to_string(),
                    });
                };
                deps.push(target);
            }
            edges.push(deps);
        }

        let graph = ProjectGraph {
            modules,
            index,
            edges,
        };
        graph.check_cycles()?;
        Ok(graph)
    }

    /// Three-color DFS from every unvisited module.
    fn check_cycles(&self) -> Result<(), BuildError> {
        let mut marks = vec![Mark::Unvisited; self.modules.len()];
        let mut path = Vec::new();

        for start in 0..self.modules.len() {
            if marks[start] == Mark::Unvisited {
                self.dfs(start, &mut marks, &mut path)?;
            }
        }

        Ok(())
    }

    fn dfs(
        &self,
        node: usize,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Result<(), BuildError> {
        marks[node] = Mark::InProgress;
        path.push(node);

        for &dep in &self.edges[node] {
            match marks[dep] {
                Mark::InProgress => {
                    // Close the loop: slice the path from the first occurrence
                    // of `dep` and append `dep` again.
                    let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut chain: Vec<String> = path[start..]
                        .iter()
                        .map(|&i| self.modules[i].name.to_string())
                        .collect();
                    chain.push(self.modules[dep].name.to_string());
                    return Err(BuildError::CircularDependency { chain });
                }
                Mark::Unvisited => self.dfs(dep, marks, path)?,
                Mark::Done => {}
            }
        }

        path.pop();
        marks[node] = Mark::Done;
        Ok(())
    }

    /// Modules in declaration order.
    pub fn modules(&self) -> &[ModuleConfig] {
        &self.modules
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Look up a module by name.
    pub fn get(&self, name: &ModuleName) -> Option<&ModuleConfig> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    /// Arena index of a module.
    pub fn index_of(&self, name: &ModuleName) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Dependency indices of the module at `index`.
    pub fn deps_of(&self, index: usize) -> &[usize] {
        &self.edges[index]
    }

    /// Module at an arena index.
    pub fn module_at(&self, index: usize) -> &ModuleConfig {
        &self.modules[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, deps: &[&str]) -> ModuleConfig {
        let mut config = ModuleConfig::new(name, "c", format!("src/{name}"));
        for dep in deps {
            config = config.with_dependency(*dep);
        }
        config
    }

    #[test]
    fn test_empty_set_is_valid() {
        let graph = ProjectGraph::analyze(vec![]).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_missing_dependency_names_referrer() {
        let err = ProjectGraph::analyze(vec![module("app", &["ghost"])]).unwrap_err();

        assert_eq!(
            err,
            BuildError::DependencyNotFound {
                missing: "ghost".to_string(),
                referrer: "app".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_module_names_are_rejected() {
        let err =
            ProjectGraph::analyze(vec![module("core", &[]), module("core", &[])]).unwrap_err();
        assert_eq!(err.code(), "config-invalid");

        // Name identity is case-insensitive, so a respelled duplicate is
        // still a duplicate.
        let err =
            ProjectGraph::analyze(vec![module("Core", &[]), module("core", &[])]).unwrap_err();
        assert_eq!(err.code(), "config-invalid");
    }

    #[test]
    fn test_dependencies_resolve_case_insensitively() {
        let graph = ProjectGraph::analyze(vec![
            module("Core", &[]),
            module("app", &["core"]),
        ])
        .unwrap();

        assert_eq!(graph.deps_of(1), &[0]);
    }

    #[test]
    fn test_two_node_cycle_chain() {
        let err =
            ProjectGraph::analyze(vec![module("x", &["y"]), module("y", &["x"])]).unwrap_err();

        assert_eq!(
            err,
            BuildError::CircularDependency {
                chain: vec!["x".to_string(), "y".to_string(), "x".to_string()],
            }
        );
    }

    #[test]
    fn test_self_cycle() {
        let err = ProjectGraph::analyze(vec![module("solo", &["solo"])]).unwrap_err();

        assert_eq!(
            err,
            BuildError::CircularDependency {
                chain: vec!["solo".to_string(), "solo".to_string()],
            }
        );
    }

    #[test]
    fn test_cycle_chain_uses_declared_edges() {
        // a -> b -> c -> b: the reported chain must start at the cycle entry,
        // not the DFS root.
        let err = ProjectGraph::analyze(vec![
            module("a", &["b"]),
            module("b", &["c"]),
            module("c", &["b"]),
        ])
        .unwrap_err();

        let BuildError::CircularDependency { chain } = err else {
            panic!("expected cycle");
        };
        assert_eq!(chain, vec!["b", "c", "b"]);
        assert_eq!(chain.first(), chain.last());
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let graph = ProjectGraph::analyze(vec![
            module("base", &[]),
            module("left", &["base"]),
            module("right", &["base"]),
            module("top", &["left", "right"]),
        ])
        .unwrap();

        assert_eq!(graph.len(), 4);
    }
}
