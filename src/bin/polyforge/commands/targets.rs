//! `polyforge targets` command

use anyhow::Result;
use serde_json::json;

use polyforge::{CrossTarget, ToolchainResolver};

use crate::cli::TargetsArgs;

pub fn execute(args: TargetsArgs) -> Result<()> {
    let mut resolver = if args.validate {
        ToolchainResolver::new()
    } else {
        ToolchainResolver::probe_only()
    };

    let descriptors: Vec<_> = CrossTarget::well_known()
        .into_iter()
        .map(|target| resolver.resolve(target))
        .collect();

    if args.json {
        let entries: Vec<_> = descriptors
            .iter()
            .map(|d| {
                json!({
                    "triple": d.target.triple(),
                    "compiler": d.compiler,
                    "available": d.available,
                    "message": d.message,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for descriptor in &descriptors {
        let mark = if descriptor.available { "ok " } else { "-- " };
        println!(
            "{mark}{:<28} {}",
            descriptor.target.triple(),
            descriptor.message
        );
    }
    Ok(())
}
