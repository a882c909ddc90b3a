//! The compilation orchestrator.
//!
//! Executes a [`BuildSchedule`] layer by layer: within a layer every module
//! compiles in parallel, and the next layer never starts until the whole
//! layer has reported. A module's compile therefore never begins before all
//! of its dependencies compiled successfully. On failure, siblings already
//! running in the same layer finish (their logs are kept) but no further
//! layer starts; everything left is reported as skipped.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::core::module::{BuildProfile, ModuleConfig, ModuleName};
use crate::core::target::CrossTarget;
use crate::error::BuildError;
use crate::graph::{BuildSchedule, ProjectGraph};
use crate::plugin::{CompileRequest, CompileResult, PluginRegistry};
use crate::toolchain::{ToolchainDescriptor, ToolchainResolver};

/// What happened to one module during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Succeeded,
    Failed,
    /// Scheduled but never started because an earlier layer failed.
    Skipped,
}

/// One module's build record.
#[derive(Debug)]
pub struct ModuleOutcome {
    pub name: ModuleName,
    pub status: ModuleStatus,
    /// Present unless the module was skipped.
    pub result: Option<CompileResult>,
}

/// Aggregate result of one orchestrator run.
///
/// Counts are always reported, even on early abort.
#[derive(Debug)]
pub struct BuildReport {
    pub outcomes: Vec<ModuleOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// First failed module in declaration order, with its error.
    pub first_failure: Option<(ModuleName, BuildError)>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Look up one module's outcome.
    pub fn outcome(&self, name: &ModuleName) -> Option<&ModuleOutcome> {
        self.outcomes.iter().find(|o| &o.name == name)
    }
}

/// Per-run build settings.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub profile: BuildProfile,
    pub target: CrossTarget,
    /// Restrict the build to one module and its dependency closure.
    pub only: Option<ModuleName>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            profile: BuildProfile::Debug,
            target: CrossTarget::native(),
            only: None,
        }
    }
}

/// Executes schedules against a plugin registry.
///
/// Each run is stateless: the schedule is derived fresh and discarded, and
/// only the resolver's toolchain cache persists across runs.
pub struct Orchestrator<'a> {
    registry: &'a PluginRegistry,
    resolver: ToolchainResolver,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Orchestrator {
            registry,
            resolver: ToolchainResolver::new(),
        }
    }

    /// Orchestrator that skips trial-compile validation, for tests and
    /// dry inspection.
    pub fn probe_only(registry: &'a PluginRegistry) -> Self {
        Orchestrator {
            registry,
            resolver: ToolchainResolver::probe_only(),
        }
    }

    /// Build a validated graph.
    ///
    /// The returned report is an `Err` only for pre-build failures (an
    /// unknown `only` module); per-module compile failures are carried
    /// inside the report.
    pub fn run(
        &mut self,
        graph: &ProjectGraph,
        options: &BuildOptions,
    ) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let schedule = BuildSchedule::plan(graph);

        // Restriction to a single module's closure happens before any
        // toolchain work so a bad module name aborts cheaply.
        let selected: Option<HashSet<ModuleName>> = match &options.only {
            Some(target) => Some(
                schedule
                    .restricted_to(graph, target)?
                    .into_iter()
                    .collect(),
            ),
            None => None,
        };
        let in_build = |name: &ModuleName| selected.as_ref().map_or(true, |s| s.contains(name));

        // One resolution per run; the descriptor is shared read-only by
        // every compile in every layer.
        let toolchain = self.resolver.resolve(options.target);
        tracing::debug!(
            target_triple = %toolchain.target.triple(),
            available = toolchain.available,
            "resolved toolchain"
        );

        let mut outcomes = Vec::new();
        let mut first_failure: Option<(ModuleName, BuildError)> = None;

        let mut layers = schedule.layers().iter();
        for layer in layers.by_ref() {
            let members: Vec<&ModuleConfig> = layer
                .iter()
                .filter(|name| in_build(name))
                .filter_map(|name| graph.get(name))
                .collect();
            if members.is_empty() {
                continue;
            }

            tracing::info!(modules = members.len(), "compiling layer");

            // par_iter preserves order, so results come back in the
            // layer's declaration order.
            let results: Vec<CompileResult> = members
                .par_iter()
                .map(|module| self.compile_module(module, options, &toolchain))
                .collect();

            let mut layer_failed = false;
            for (module, result) in members.iter().zip(results) {
                let status = if result.success {
                    ModuleStatus::Succeeded
                } else {
                    layer_failed = true;
                    if first_failure.is_none() {
                        let error = result.error.clone().unwrap_or_else(|| {
                            BuildError::CompileFailed {
                                module: module.name.to_string(),
                                detail: "unknown failure".to_string(),
                            }
                        });
                        first_failure = Some((module.name.clone(), error));
                    }
                    ModuleStatus::Failed
                };
                outcomes.push(ModuleOutcome {
                    name: module.name.clone(),
                    status,
                    result: Some(result),
                });
            }

            if layer_failed {
                break;
            }
        }

        // Whatever the iterator still holds was never started.
        for layer in layers {
            for name in layer.iter().filter(|name| in_build(name)) {
                outcomes.push(ModuleOutcome {
                    name: name.clone(),
                    status: ModuleStatus::Skipped,
                    result: None,
                });
            }
        }

        let succeeded = outcomes
            .iter()
            .filter(|o| o.status == ModuleStatus::Succeeded)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| o.status == ModuleStatus::Failed)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == ModuleStatus::Skipped)
            .count();

        if let Some((name, error)) = &first_failure {
            tracing::error!(module = %name, %error, "build failed");
        }

        Ok(BuildReport {
            outcomes,
            succeeded,
            failed,
            skipped,
            first_failure,
            elapsed: start.elapsed(),
        })
    }

    /// Compile one module, folding plugin lookup and toolchain validation
    /// failures into the module's own result.
    fn compile_module(
        &self,
        module: &ModuleConfig,
        options: &BuildOptions,
        toolchain: &ToolchainDescriptor,
    ) -> CompileResult {
        let start = Instant::now();

        let plugin = match self.registry.lookup(&module.language) {
            Ok(plugin) => plugin,
            Err(error) => return CompileResult::failure(error, Vec::new(), start.elapsed()),
        };

        let (available, message) = plugin.validate_toolchain(toolchain);
        if !available {
            let error = BuildError::ToolchainUnavailable {
                target: toolchain.target.triple(),
                reason: message,
            };
            return CompileResult::failure(error, Vec::new(), start.elapsed());
        }

        let request = CompileRequest {
            module,
            profile: options.profile,
            target: options.target,
            toolchain,
        };
        plugin.compile(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use crate::core::interface::InterfaceDescription;
    use crate::plugin::LanguagePlugin;

    /// Plugin that "compiles" instantly, failing for configured modules.
    struct ScriptedPlugin {
        id: &'static str,
        fail_modules: Vec<&'static str>,
        toolchain_missing: bool,
    }

    impl ScriptedPlugin {
        fn ok(id: &'static str) -> Self {
            ScriptedPlugin {
                id,
                fail_modules: Vec::new(),
                toolchain_missing: false,
            }
        }

        fn failing(id: &'static str, modules: &[&'static str]) -> Self {
            ScriptedPlugin {
                id,
                fail_modules: modules.to_vec(),
                toolchain_missing: false,
            }
        }

        fn without_toolchain(id: &'static str) -> Self {
            ScriptedPlugin {
                id,
                fail_modules: Vec::new(),
                toolchain_missing: true,
            }
        }
    }

    impl LanguagePlugin for ScriptedPlugin {
        fn language(&self) -> &str {
            self.id
        }

        fn validate_toolchain(&self, _toolchain: &ToolchainDescriptor) -> (bool, String) {
            if self.toolchain_missing {
                (false, format!("no {} compiler installed", self.id))
            } else {
                (true, "ok".to_string())
            }
        }

        fn compile(&self, request: &CompileRequest<'_>) -> CompileResult {
            let name = request.module.name.as_str();
            if self.fail_modules.contains(&name) {
                CompileResult::failure(
                    BuildError::CompileFailed {
                        module: name.to_string(),
                        detail: "scripted failure".to_string(),
                    },
                    vec![format!("error in {name}")],
                    Duration::ZERO,
                )
            } else {
                CompileResult::success(Vec::new(), vec![format!("built {name}")], Duration::ZERO)
            }
        }

        fn extract_interface(&self, _artifact: &Path) -> Result<InterfaceDescription, BuildError> {
            Ok(InterfaceDescription::new("scripted", self.id))
        }
    }

    fn module(name: &str, language: &str, deps: &[&str]) -> ModuleConfig {
        let mut config = ModuleConfig::new(name, language, format!("src/{name}"));
        for dep in deps {
            config = config.with_dependency(*dep);
        }
        config
    }

    fn registry(plugin: ScriptedPlugin) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(plugin));
        registry
    }

    fn graph(modules: Vec<ModuleConfig>) -> ProjectGraph {
        ProjectGraph::analyze(modules).unwrap()
    }

    #[test]
    fn test_full_build_succeeds() {
        let registry = registry(ScriptedPlugin::ok("fake"));
        let graph = graph(vec![
            module("core", "fake", &[]),
            module("net", "fake", &["core"]),
            module("app", "fake", &["net", "core"]),
        ]);

        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &BuildOptions::default()).unwrap();

        assert!(report.success());
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.skipped, 0);
        assert!(report.first_failure.is_none());
    }

    #[test]
    fn test_failure_stops_later_layers_but_siblings_finish() {
        // Layers: [base], [bad, good], [top].
        let registry = registry(ScriptedPlugin::failing("fake", &["bad"]));
        let graph = graph(vec![
            module("base", "fake", &[]),
            module("bad", "fake", &["base"]),
            module("good", "fake", &["base"]),
            module("top", "fake", &["bad", "good"]),
        ]);

        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &BuildOptions::default()).unwrap();

        assert!(!report.success());
        assert_eq!(report.succeeded, 2); // base and good
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1); // top never started

        // The sibling in the failing layer still ran and kept its logs.
        let good = report.outcome(&"good".into()).unwrap();
        assert_eq!(good.status, ModuleStatus::Succeeded);
        assert!(good.result.as_ref().unwrap().logs[0].contains("built good"));

        let top = report.outcome(&"top".into()).unwrap();
        assert_eq!(top.status, ModuleStatus::Skipped);
        assert!(top.result.is_none());

        let (name, error) = report.first_failure.as_ref().unwrap();
        assert_eq!(name.as_str(), "bad");
        assert_eq!(error.code(), "compile-failed");
    }

    #[test]
    fn test_first_failure_reported_in_declaration_order() {
        // Both fail in the same layer; "early" is declared first.
        let registry = registry(ScriptedPlugin::failing("fake", &["early", "late"]));
        let graph = graph(vec![
            module("early", "fake", &[]),
            module("late", "fake", &[]),
        ]);

        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &BuildOptions::default()).unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.first_failure.unwrap().0.as_str(), "early");
    }

    #[test]
    fn test_missing_toolchain_is_the_modules_own_failure() {
        let registry = registry(ScriptedPlugin::without_toolchain("fake"));
        let graph = graph(vec![module("solo", "fake", &[])]);

        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &BuildOptions::default()).unwrap();

        assert_eq!(report.failed, 1);
        let (name, error) = report.first_failure.unwrap();
        assert_eq!(name.as_str(), "solo");
        assert_eq!(error.code(), "toolchain-unavailable");
        assert!(error.to_string().contains("no fake compiler installed"));
    }

    #[test]
    fn test_missing_plugin_is_the_modules_own_failure() {
        let registry = registry(ScriptedPlugin::ok("fake"));
        let graph = graph(vec![
            module("known", "fake", &[]),
            module("alien", "cobol", &[]),
        ]);

        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &BuildOptions::default()).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        let (name, error) = report.first_failure.unwrap();
        assert_eq!(name.as_str(), "alien");
        assert_eq!(error.code(), "plugin-not-found");
    }

    #[test]
    fn test_only_filter_builds_dependency_closure() {
        let registry = registry(ScriptedPlugin::ok("fake"));
        let graph = graph(vec![
            module("a", "fake", &[]),
            module("b", "fake", &["a"]),
            module("c", "fake", &[]),
        ]);

        let options = BuildOptions {
            only: Some("b".into()),
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &options).unwrap();

        assert!(report.success());
        assert_eq!(report.succeeded, 2);
        assert!(report.outcome(&"a".into()).is_some());
        assert!(report.outcome(&"b".into()).is_some());
        assert!(report.outcome(&"c".into()).is_none());
    }

    #[test]
    fn test_unknown_only_module_aborts_before_compiling() {
        let registry = registry(ScriptedPlugin::ok("fake"));
        let graph = graph(vec![module("a", "fake", &[])]);

        let options = BuildOptions {
            only: Some("ghost".into()),
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::probe_only(&registry);
        let err = orchestrator.run(&graph, &options).unwrap_err();

        assert_eq!(err.code(), "module-not-found");
    }

    #[test]
    fn test_empty_graph_builds_trivially() {
        let registry = registry(ScriptedPlugin::ok("fake"));
        let graph = graph(Vec::new());

        let mut orchestrator = Orchestrator::probe_only(&registry);
        let report = orchestrator.run(&graph, &BuildOptions::default()).unwrap();

        assert!(report.success());
        assert_eq!(report.succeeded + report.failed + report.skipped, 0);
    }
}
