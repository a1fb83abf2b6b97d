use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{config::Settings, registry::ExtensionRegistry, runtime::Runtime};

/// List all registered extensions
#[tracing::instrument(skip(runtime, install_root))]
pub fn list<R: Runtime>(runtime: R, install_root: Option<PathBuf>) -> Result<()> {
    let settings = Settings::resolve(&runtime, install_root)?;
    debug!("Listing extensions from {:?}", settings.manifest_path);

    let registry = ExtensionRegistry::load(&runtime, &settings.root, &settings.manifest_path)?;
    for line in render(&registry) {
        println!("{}", line);
    }
    Ok(())
}

fn render<R: Runtime>(registry: &ExtensionRegistry<'_, R>) -> Vec<String> {
    if registry.is_empty() {
        return vec!["No extensions registered.".to_string()];
    }

    let mut lines = Vec::new();
    for (name, record) in registry.iter() {
        lines.push(format!("{} {}", name, record.version));
        for (alias, path) in &record.alias {
            lines.push(format!("  {} => {}", alias, path));
        }
        if let Some(bootstrap) = &record.bootstrap {
            lines.push(format!("  bootstrap: {}", bootstrap));
        }
    }
    lines
}
