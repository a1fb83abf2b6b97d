//! Entry point for the host package manager.
//!
//! The host activates a [`Plugin`] once per invocation and forwards its
//! lifecycle events to the `on_*` handlers. Install, update and uninstall of
//! extension packages keep the manifest current; package updates of any type
//! feed the upgrade notifier.

use anyhow::Result;
use log::{debug, info};

use crate::changelog::{ChangelogSource, FileChangelogSource};
use crate::config::Settings;
use crate::notifier::{OutputSink, UpgradeNotifier, VersionPolicy};
use crate::package::PackageInfo;
use crate::registry::ExtensionRegistry;
use crate::runtime::Runtime;

pub struct Plugin<'a, R: Runtime, S: OutputSink, C: ChangelogSource> {
    runtime: &'a R,
    settings: Settings,
    notifier: UpgradeNotifier<S, C>,
}

impl<'a, R: Runtime, S: OutputSink> Plugin<'a, R, S, FileChangelogSource<'a, R>> {
    /// A plugin reading changelogs from the installation root.
    pub fn with_file_changelogs(runtime: &'a R, settings: Settings, sink: S) -> Self {
        let source = FileChangelogSource::new(runtime, &settings.root);
        Self::new(runtime, settings, sink, source)
    }
}

impl<'a, R: Runtime, S: OutputSink, C: ChangelogSource> Plugin<'a, R, S, C> {
    pub fn new(runtime: &'a R, settings: Settings, sink: S, source: C) -> Self {
        let notifier = UpgradeNotifier::new(sink, source, settings.watch.clone());
        Self {
            runtime,
            settings,
            notifier,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notifier(&self) -> &UpgradeNotifier<S, C> {
        &self.notifier
    }

    /// Make sure the manifest exists so the framework can always load it.
    #[tracing::instrument(skip(self))]
    pub fn activate(&self) -> Result<bool> {
        ExtensionRegistry::ensure_manifest(self.runtime, &self.settings.manifest_path)
    }

    /// Whether packages of `package_type` are extensions handled here.
    pub fn supports(&self, package_type: &str) -> bool {
        package_type == self.settings.extension_type
    }

    fn load_registry(&self) -> Result<ExtensionRegistry<'a, R>> {
        ExtensionRegistry::load(
            self.runtime,
            &self.settings.root,
            &self.settings.manifest_path,
        )
    }

    #[tracing::instrument(skip(self, package), fields(package = %package.name))]
    pub fn on_package_installed(&self, package: &PackageInfo) -> Result<()> {
        if !self.supports(&package.package_type) {
            debug!("{} is not an extension, skipping", package.name);
            return Ok(());
        }

        let mut registry = self.load_registry()?;
        registry.add_package(package);
        registry.save()?;
        info!("Registered extension {} {}", package.name, package.display_version());
        Ok(())
    }

    #[tracing::instrument(skip(self, initial, target), fields(package = %target.name))]
    pub fn on_package_updated(&self, initial: &PackageInfo, target: &PackageInfo) -> Result<()> {
        let was_extension = self.supports(&initial.package_type);
        let is_extension = self.supports(&target.package_type);
        if !was_extension && !is_extension {
            debug!("{} is not an extension, skipping", target.name);
            return Ok(());
        }

        let mut registry = self.load_registry()?;
        registry.remove(&initial.name);
        if is_extension {
            registry.add_package(target);
        }
        registry.save()?;
        info!(
            "Updated extension {} {} -> {}",
            target.name,
            initial.display_version(),
            target.display_version()
        );
        Ok(())
    }

    #[tracing::instrument(skip(self, package), fields(package = %package.name))]
    pub fn on_package_uninstalled(&self, package: &PackageInfo) -> Result<()> {
        if !self.supports(&package.package_type) {
            debug!("{} is not an extension, skipping", package.name);
            return Ok(());
        }

        let mut registry = self.load_registry()?;
        if registry.remove(&package.name).is_none() {
            debug!("{} was not registered", package.name);
            return Ok(());
        }
        registry.save()?;
        info!("Unregistered extension {}", package.name);
        Ok(())
    }

    pub fn on_package_update_noted<P: VersionPolicy + ?Sized>(
        &mut self,
        initial: &PackageInfo,
        target: &PackageInfo,
        policy: &P,
    ) {
        self.notifier.on_package_update_noted(initial, target, policy);
    }

    pub fn on_resolution_run_completed(&mut self) -> usize {
        self.notifier.on_resolution_run_completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::MockChangelogSource;
    use crate::error::ManifestError;
    use crate::package::VersionToken;
    use crate::runtime::RealRuntime;
    use std::path::Path;
    use tempfile::tempdir;

    fn extension(name: &str, version: &str) -> PackageInfo {
        let mut package = PackageInfo::new(name, version);
        package.package_type = "yii2-extension".to_string();
        package
            .autoload
            .psr4
            .insert("acme\\widgets\\".to_string(), "src".to_string());
        package
    }

    fn plugin_at<'a>(
        runtime: &'a RealRuntime,
        root: &Path,
    ) -> Plugin<'a, RealRuntime, Vec<String>, FileChangelogSource<'a, RealRuntime>> {
        Plugin::with_file_changelogs(runtime, Settings::new(root), Vec::new())
    }

    fn upgrade(a: &PackageInfo, b: &PackageInfo) -> bool {
        VersionToken::parse(a.display_version()) < VersionToken::parse(b.display_version())
    }

    #[test]
    fn test_activate_creates_manifest() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let plugin = plugin_at(&runtime, dir.path());

        assert!(plugin.activate().unwrap());
        assert!(plugin.settings().manifest_path.is_file());
        assert!(!plugin.activate().unwrap());
    }

    #[test]
    fn test_install_update_uninstall() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let plugin = plugin_at(&runtime, dir.path());
        let manifest = plugin.settings().manifest_path.clone();

        plugin
            .on_package_installed(&extension("acme/widgets", "1.0.0.0"))
            .unwrap();
        let registry = ExtensionRegistry::load(&runtime, dir.path(), &manifest).unwrap();
        assert_eq!(registry.get("acme/widgets").unwrap().version, "1.0.0.0");

        plugin
            .on_package_updated(
                &extension("acme/widgets", "1.0.0.0"),
                &extension("acme/widgets", "1.1.0.0"),
            )
            .unwrap();
        let registry = ExtensionRegistry::load(&runtime, dir.path(), &manifest).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("acme/widgets").unwrap().version, "1.1.0.0");

        plugin
            .on_package_uninstalled(&extension("acme/widgets", "1.1.0.0"))
            .unwrap();
        let registry = ExtensionRegistry::load(&runtime, dir.path(), &manifest).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_other_package_types_are_ignored() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let plugin = plugin_at(&runtime, dir.path());

        let library = PackageInfo::new("acme/lib", "1.0.0.0");
        plugin.on_package_installed(&library).unwrap();
        plugin.on_package_uninstalled(&library).unwrap();

        assert!(!plugin.settings().manifest_path.exists());
    }

    #[test]
    fn test_uninstall_unregistered_leaves_manifest_alone() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let plugin = plugin_at(&runtime, dir.path());

        plugin
            .on_package_uninstalled(&extension("acme/widgets", "1.0.0.0"))
            .unwrap();
        assert!(!plugin.settings().manifest_path.exists());

        let manifest = plugin.settings().manifest_path.clone();
        std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std::fs::write(&manifest, "{ }").unwrap();

        plugin
            .on_package_uninstalled(&extension("acme/widgets", "1.0.0.0"))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&manifest).unwrap(), "{ }");
    }

    #[test]
    fn test_corrupt_manifest_aborts_install() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let plugin = plugin_at(&runtime, dir.path());
        let manifest = plugin.settings().manifest_path.clone();

        std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std::fs::write(&manifest, "<?php return [];").unwrap();

        let err = plugin
            .on_package_installed(&extension("acme/widgets", "1.0.0.0"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Corrupt { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(&manifest).unwrap(),
            "<?php return [];"
        );
    }

    #[test]
    fn test_update_run_prints_notes_from_root() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let framework_dir = dir.path().join("yiisoft").join("yii2");
        std::fs::create_dir_all(&framework_dir).unwrap();
        std::fs::write(
            framework_dir.join("UPGRADE.md"),
            crate::changelog::fixtures::UPGRADE_MD,
        )
        .unwrap();

        let mut plugin = plugin_at(&runtime, dir.path());
        plugin.on_package_update_noted(
            &PackageInfo::new("yiisoft/yii2", "2.0.13.1"),
            &PackageInfo::new("yiisoft/yii2", "2.0.14"),
            &upgrade,
        );

        assert_eq!(plugin.on_resolution_run_completed(), 1);
        let message = &plugin.notifier().sink()[0];
        assert!(message.contains("upgraded Yii Framework from version 2.0.13.1 to 2.0.14"));
        assert!(message.contains("These are the upgrade notes from 2.0.14."));
        assert!(message.contains("/blob/2.0.14/framework/UPGRADE.md"));
    }

    #[test]
    fn test_update_run_with_injected_source() {
        let mut source = MockChangelogSource::new();
        source.expect_changelog().returning(|_| None);

        let runtime = RealRuntime;
        let settings = Settings::new(Path::new("/nonexistent/vendor"));
        let mut plugin = Plugin::new(&runtime, settings, Vec::new(), source);

        plugin.on_package_update_noted(
            &PackageInfo::new("yiisoft/yii2", "2.0.14"),
            &PackageInfo::new("yiisoft/yii2", "2.0.13"),
            &upgrade,
        );
        assert_eq!(plugin.on_resolution_run_completed(), 1);
        assert!(plugin.notifier().sink()[0].contains("downgraded"));
    }
}
