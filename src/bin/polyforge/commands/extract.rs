//! `polyforge extract` command

use anyhow::{Context, Result};

use polyforge::PluginRegistry;

use crate::cli::ExtractArgs;

pub fn execute(args: ExtractArgs) -> Result<()> {
    let registry = PluginRegistry::with_builtins();
    let plugin = registry.lookup(&args.language)?;

    let interface = plugin.extract_interface(&args.artifact)?;
    tracing::info!(
        module = %interface.module,
        exports = interface.functions.len(),
        "extracted interface"
    );

    let text = interface.to_text();
    match &args.out {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {} ({} exports)", path.display(), interface.functions.len());
        }
        None => print!("{text}"),
    }
    Ok(())
}
