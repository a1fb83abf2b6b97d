use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    changelog::FileChangelogSource,
    config::{Settings, WatchedPackage},
    notifier::{ConsoleSink, OutputSink},
    package::{PackageInfo, VersionToken},
    plugin::Plugin,
    runtime::Runtime,
};

/// Show the upgrade notes for moving `package` from one version to another
#[tracing::instrument(skip(runtime, install_root))]
pub fn notes<R: Runtime>(
    runtime: R,
    install_root: Option<PathBuf>,
    package: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    let settings = Settings::resolve(&runtime, install_root)?;
    let (written, _) = replay(&runtime, settings, ConsoleSink, package, from, to);
    if written == 0 {
        println!("No upgrade notes for {} {} -> {}.", package, from, to);
    }
    Ok(())
}

/// Feed a single update through the plugin as the host would, then finish the run.
fn replay<'a, R: Runtime, S: OutputSink>(
    runtime: &'a R,
    settings: Settings,
    sink: S,
    package: &str,
    from: &str,
    to: &str,
) -> (usize, Plugin<'a, R, S, FileChangelogSource<'a, R>>) {
    let settings = if settings.watched(package).is_some() {
        settings
    } else {
        debug!("Watching {} for this run", package);
        let mut watch = settings.watch.clone();
        watch.push(WatchedPackage::new(package, package));
        settings.with_watch(watch)
    };

    let mut plugin = Plugin::with_file_changelogs(runtime, settings, sink);
    let is_upgrade = |initial: &PackageInfo, target: &PackageInfo| {
        VersionToken::parse(initial.display_version()) < VersionToken::parse(target.display_version())
    };

    plugin.on_package_update_noted(
        &PackageInfo::new(package, from),
        &PackageInfo::new(package, to),
        &is_upgrade,
    );
    let written = plugin.on_resolution_run_completed();
    (written, plugin)
}
