use anyhow::Result;
use std::path::PathBuf;

use crate::{
    changelog::FileChangelogSource, config::Settings, notifier::ConsoleSink, plugin::Plugin,
    runtime::Runtime,
};

/// Activate the plugin: create the extension manifest if it is missing
#[tracing::instrument(skip(runtime, install_root))]
pub fn init<R: Runtime>(runtime: R, install_root: Option<PathBuf>) -> Result<()> {
    let settings = Settings::resolve(&runtime, install_root)?;
    let plugin: Plugin<'_, R, ConsoleSink, FileChangelogSource<'_, R>> =
        Plugin::with_file_changelogs(&runtime, settings, ConsoleSink);

    let manifest = plugin.settings().manifest_path.display().to_string();
    if plugin.activate()? {
        println!("Created {}", manifest);
    } else {
        println!("{} already exists", manifest);
    }
    Ok(())
}
