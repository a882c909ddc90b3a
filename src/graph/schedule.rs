//! Layered build scheduling.
//!
//! Converts a validated [`ProjectGraph`] into layers of modules that can be
//! compiled in parallel: every module's dependencies live in strictly earlier
//! layers.

use serde::Serialize;

use crate::core::module::ModuleName;
use crate::error::BuildError;
use crate::graph::analyzer::ProjectGraph;

/// An ordered sequence of parallel-executable layers.
///
/// Concatenating the layers yields a valid topological order; each module
/// appears in exactly one layer. Within a layer, modules keep their manifest
/// declaration order so builds stay reproducible.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSchedule {
    layers: Vec<Vec<ModuleName>>,
}

impl BuildSchedule {
    /// Derive the schedule via a Kahn-style ready set.
    ///
    /// Layer 0 holds every module with zero dependencies; layer `k` holds the
    /// not-yet-scheduled modules whose dependencies are all in layers `< k`.
    pub fn plan(graph: &ProjectGraph) -> Self {
        let n = graph.len();
        let mut scheduled = vec![false; n];
        let mut remaining = n;
        let mut layers = Vec::new();

        while remaining > 0 {
            let mut layer = Vec::new();

            // Declaration-order scan keeps intra-layer ordering deterministic.
            for i in 0..n {
                if scheduled[i] {
                    continue;
                }
                if graph.deps_of(i).iter().all(|&d| scheduled[d]) {
                    layer.push(i);
                }
            }

            // The graph is validated acyclic, so a stalled iteration cannot
            // happen; guard anyway so a logic bug can't spin forever.
            debug_assert!(!layer.is_empty(), "scheduler stalled on acyclic graph");
            if layer.is_empty() {
                break;
            }

            for &i in &layer {
                scheduled[i] = true;
            }
            remaining -= layer.len();

            layers.push(
                layer
                    .into_iter()
                    .map(|i| graph.module_at(i).name.clone())
                    .collect(),
            );
        }

        BuildSchedule { layers }
    }

    /// The layers, earliest first.
    pub fn layers(&self) -> &[Vec<ModuleName>] {
        &self.layers
    }

    /// Total number of scheduled modules.
    pub fn module_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Size of the largest layer.
    pub fn max_parallelism(&self) -> usize {
        self.layers.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Layer concatenation as a flat topological order.
    pub fn flattened(&self) -> Vec<ModuleName> {
        self.layers.iter().flatten().cloned().collect()
    }

    /// The flattened order restricted to `target` and its transitive
    /// dependency closure.
    ///
    /// Supports single-module build requests without re-deriving the whole
    /// schedule: the closure is computed by reverse reachability from the
    /// target and the layered order is filtered to it.
    pub fn restricted_to(
        &self,
        graph: &ProjectGraph,
        target: &ModuleName,
    ) -> Result<Vec<ModuleName>, BuildError> {
        let start = graph
            .index_of(target)
            .ok_or_else(|| BuildError::ModuleNotFound {
                module: target.to_string(),
            })?;

        let mut in_closure = vec![false; graph.len()];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if in_closure[node] {
                continue;
            }
            in_closure[node] = true;
            stack.extend(graph.deps_of(node));
        }

        Ok(self
            .flattened()
            .into_iter()
            .filter(|name| graph.index_of(name).is_some_and(|i| in_closure[i]))
            .collect())
    }
}
