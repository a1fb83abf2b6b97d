//! Settings shared by the plugin and the command-line host.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::path::resolve_relative_path;
use crate::runtime::{Runtime, normalize_path};

/// Manifest location relative to the installation root.
pub const DEFAULT_MANIFEST: &str = "yiisoft/extensions.json";

/// Package type handled by the extension installer.
pub const DEFAULT_EXTENSION_TYPE: &str = "yii2-extension";

/// Environment variable overriding the installation root.
pub const ROOT_ENV: &str = "YEXT_ROOT";

/// A package whose updates produce an upgrade notification.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedPackage {
    pub name: String,
    /// Name used in messages, e.g. "Yii Framework".
    pub display_name: String,
    /// Online notes; `{ref}` is replaced by the branch or tag to link to.
    pub notes_url: Option<String>,
}

impl WatchedPackage {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            notes_url: None,
        }
    }

    pub fn with_notes_url(mut self, template: &str) -> Self {
        self.notes_url = Some(template.to_string());
        self
    }

    /// The online notes for `version`, with a `dev-` branch prefix dropped.
    pub fn notes_link(&self, version: &str) -> Option<String> {
        let git_ref = version.strip_prefix("dev-").unwrap_or(version);
        self.notes_url
            .as_ref()
            .map(|template| template.replace("{ref}", git_ref))
    }
}

impl Default for WatchedPackage {
    fn default() -> Self {
        WatchedPackage::new("yiisoft/yii2", "Yii Framework")
            .with_notes_url("https://github.com/yiisoft/yii2/blob/{ref}/framework/UPGRADE.md")
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Installation root (the vendor directory).
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub extension_type: String,
    pub watch: Vec<WatchedPackage>,
}

impl Settings {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            manifest_path: root.join(DEFAULT_MANIFEST),
            extension_type: DEFAULT_EXTENSION_TYPE.to_string(),
            watch: vec![WatchedPackage::default()],
        }
    }

    /// Build settings from an explicit root, `YEXT_ROOT`, or the default one.
    #[tracing::instrument(skip(runtime))]
    pub fn resolve<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(path) => path,
            None => match runtime.env_var(ROOT_ENV) {
                Ok(value) if !value.is_empty() => PathBuf::from(value),
                _ => default_root(runtime)?,
            },
        };
        let root = absolute_root(runtime, &root)?;
        debug!("Using installation root {:?}", root);
        Ok(Self::new(&root))
    }

    pub fn with_watch(mut self, watch: Vec<WatchedPackage>) -> Self {
        self.watch = watch;
        self
    }

    pub fn watched(&self, package: &str) -> Option<&WatchedPackage> {
        self.watch.iter().find(|w| w.name == package)
    }
}

/// Anchor a relative root at the current directory.
pub fn absolute_root<R: Runtime>(runtime: &R, root: &Path) -> Result<PathBuf> {
    if root.has_root() {
        return Ok(normalize_path(root));
    }
    let cwd = runtime.current_dir()?;
    Ok(resolve_relative_path(&cwd, root))
}

/// `./vendor` under the current directory.
#[tracing::instrument(skip(runtime))]
pub fn default_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    Ok(runtime.current_dir()?.join("vendor"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_resolve_explicit_root() {
        let runtime = MockRuntime::new();
        let settings = Settings::resolve(&runtime, Some(PathBuf::from("/app/vendor"))).unwrap();
        assert_eq!(settings.root, PathBuf::from("/app/vendor"));
        assert_eq!(
            settings.manifest_path,
            PathBuf::from("/app/vendor/yiisoft/extensions.json")
        );
        assert_eq!(settings.extension_type, "yii2-extension");
    }

    #[test]
    fn test_resolve_relative_root() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/home/user/project")));

        let settings = Settings::resolve(&runtime, Some(PathBuf::from("./vendor"))).unwrap();
        assert_eq!(settings.root, PathBuf::from("/home/user/project/vendor"));
        assert_eq!(
            settings.manifest_path,
            PathBuf::from("/home/user/project/vendor/yiisoft/extensions.json")
        );
    }

    #[test]
    fn test_resolve_root_from_env() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(ROOT_ENV))
            .returning(|_| Ok("/srv/vendor".to_string()));

        let settings = Settings::resolve(&runtime, None).unwrap();
        assert_eq!(settings.root, PathBuf::from("/srv/vendor"));
    }

    #[test]
    fn test_resolve_default_root() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(ROOT_ENV))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/home/user/project")));

        let settings = Settings::resolve(&runtime, None).unwrap();
        assert_eq!(settings.root, PathBuf::from("/home/user/project/vendor"));
    }

    #[test]
    fn test_default_watch_list() {
        let settings = Settings::new(Path::new("/app/vendor"));
        assert!(settings.watched("yiisoft/yii2").is_some());
        assert!(settings.watched("yiisoft/yii2-redis").is_none());
    }

    #[test]
    fn test_notes_link() {
        let watched = WatchedPackage::default();
        assert_eq!(
            watched.notes_link("2.0.13").as_deref(),
            Some("https://github.com/yiisoft/yii2/blob/2.0.13/framework/UPGRADE.md")
        );
        assert_eq!(
            watched.notes_link("dev-master").as_deref(),
            Some("https://github.com/yiisoft/yii2/blob/master/framework/UPGRADE.md")
        );
        assert_eq!(WatchedPackage::new("core", "Core").notes_link("1.0"), None);
    }
}
