//! `polyforge graph` command

use anyhow::Result;
use serde_json::json;

use polyforge::{BuildSchedule, ProjectGraph};

use crate::cli::GraphArgs;

pub fn execute(args: GraphArgs) -> Result<()> {
    let (config, root) = super::load_project(args.manifest_path.as_deref())?;
    let graph = ProjectGraph::analyze(config.into_modules(&root))?;
    let schedule = BuildSchedule::plan(&graph);

    if args.json {
        let modules: Vec<_> = graph
            .modules()
            .iter()
            .map(|m| {
                json!({
                    "name": m.name,
                    "language": m.language,
                    "dependencies": m.dependencies,
                })
            })
            .collect();
        let dump = json!({
            "modules": modules,
            "layers": schedule.layers(),
            "max_parallelism": schedule.max_parallelism(),
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    println!(
        "{} modules, {} layers, max parallelism {}",
        graph.len(),
        schedule.layers().len(),
        schedule.max_parallelism()
    );
    for (i, layer) in schedule.layers().iter().enumerate() {
        let names: Vec<&str> = layer.iter().map(|n| n.as_str()).collect();
        println!("  layer {i}: {}", names.join(", "));
    }
    Ok(())
}
