//! `polyforge build` command

use anyhow::{bail, Result};

use polyforge::build::{BuildOptions, ModuleStatus, Orchestrator};
use polyforge::{BuildProfile, CrossTarget, PluginRegistry, ProjectGraph};

use crate::cli::BuildArgs;

pub fn execute(args: BuildArgs) -> Result<()> {
    let (config, root) = super::load_project(args.manifest_path.as_deref())?;
    let project_name = config.project.name.clone();

    let graph = ProjectGraph::analyze(config.into_modules(&root))?;

    let target = match args.target.as_deref() {
        Some(triple) => triple.parse::<CrossTarget>()?,
        None => CrossTarget::native(),
    };
    let options = BuildOptions {
        profile: if args.release {
            BuildProfile::Release
        } else {
            BuildProfile::Debug
        },
        target,
        only: args.module.as_deref().map(Into::into),
    };

    println!(
        "   Building {project_name} [{}] for {}",
        options.profile.as_str(),
        target.triple()
    );

    let registry = PluginRegistry::with_builtins();
    let mut orchestrator = Orchestrator::new(&registry);
    let report = orchestrator.run(&graph, &options)?;

    for outcome in &report.outcomes {
        match outcome.status {
            ModuleStatus::Succeeded => println!("    compiled {}", outcome.name),
            ModuleStatus::Failed => {
                println!("      failed {}", outcome.name);
                if let Some(result) = &outcome.result {
                    for line in &result.logs {
                        println!("        {line}");
                    }
                }
            }
            ModuleStatus::Skipped => println!("     skipped {}", outcome.name),
        }
    }

    println!(
        "    Finished {} succeeded, {} failed, {} skipped in {:.2}s",
        report.succeeded,
        report.failed,
        report.skipped,
        report.elapsed.as_secs_f64()
    );

    if let Some((name, error)) = &report.first_failure {
        bail!("build of `{name}` failed: {error}");
    }
    Ok(())
}
