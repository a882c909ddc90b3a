//! `polyforge glue` command

use anyhow::{Context, Result};

use polyforge::{glue, InterfaceDescription};

use crate::cli::GlueArgs;

pub fn execute(args: GlueArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.interface)
        .with_context(|| format!("failed to read {}", args.interface.display()))?;
    let interface = InterfaceDescription::from_text(&text)?;

    let result = glue::generate(&interface, &args.to)?;

    match &args.out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(&result.file_name);
            std::fs::write(&path, &result.source)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{}", result.source),
    }
    Ok(())
}
