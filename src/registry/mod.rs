//! Registry of installed extension packages.
//!
//! The registry is a single JSON document mapping package names to
//! [`ExtensionRecord`]s. It is loaded, changed and saved once per host
//! operation (install, update, uninstall).

mod alias;

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::absolute_root;
use crate::error::ManifestError;
use crate::package::PackageInfo;
use crate::runtime::Runtime;

pub use alias::{ROOT_PLACEHOLDER, collapse, derive_aliases, expand, normalize_alias_path};

/// `extra` key holding the bootstrap class of an extension.
pub const EXTRA_BOOTSTRAP: &str = "bootstrap";

/// Metadata recorded for one installed extension.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ExtensionRecord {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alias: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<String>,
}

/// In-memory view of the extension manifest.
///
/// Alias paths are absolute while loaded; they are rewritten relative to the
/// installation root only when saved.
pub struct ExtensionRegistry<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
    manifest_path: PathBuf,
    extensions: BTreeMap<String, ExtensionRecord>,
}

impl<'a, R: Runtime> ExtensionRegistry<'a, R> {
    /// Load the manifest at `manifest_path`.
    ///
    /// A missing manifest yields an empty registry. A manifest that cannot
    /// be parsed is a [`ManifestError::Corrupt`] error. A relative `root` is
    /// taken from the current directory.
    #[tracing::instrument(skip(runtime))]
    pub fn load(runtime: &'a R, root: &Path, manifest_path: &Path) -> Result<Self> {
        let root = absolute_root(runtime, root)?;
        let mut registry = Self {
            runtime,
            root: root.clone(),
            manifest_path: manifest_path.to_path_buf(),
            extensions: BTreeMap::new(),
        };

        if !runtime.exists(manifest_path) {
            debug!("No extension manifest at {:?}, starting empty", manifest_path);
            return Ok(registry);
        }

        let content =
            runtime
                .read_to_string(manifest_path)
                .map_err(|e| ManifestError::Unreadable {
                    path: manifest_path.to_path_buf(),
                    source: e.into(),
                })?;

        let mut extensions: BTreeMap<String, ExtensionRecord> = serde_json::from_str(&content)
            .map_err(|e| ManifestError::Corrupt {
                path: manifest_path.to_path_buf(),
                source: e,
            })?;

        for record in extensions.values_mut() {
            for path in record.alias.values_mut() {
                *path = expand(path, &root);
            }
        }

        debug!(
            "Loaded {} extension(s) from {:?}",
            extensions.len(),
            manifest_path
        );
        registry.extensions = extensions;
        Ok(registry)
    }

    /// Create an empty manifest if none exists yet.
    ///
    /// Returns `true` when a new file was written.
    #[tracing::instrument(skip(runtime))]
    pub fn ensure_manifest(runtime: &R, manifest_path: &Path) -> Result<bool> {
        if runtime.exists(manifest_path) {
            return Ok(false);
        }

        write_atomically(runtime, manifest_path, b"{}\n")?;
        info!("Created empty extension manifest at {:?}", manifest_path);
        Ok(true)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Insert or replace the record of `name`.
    ///
    /// Alias paths are normalized; placeholder paths are resolved against the
    /// current root.
    pub fn add(
        &mut self,
        name: &str,
        version: &str,
        alias: Option<BTreeMap<String, String>>,
        bootstrap: Option<String>,
    ) {
        let alias = alias
            .unwrap_or_default()
            .into_iter()
            .map(|(key, path)| (key, normalize_alias_path(&expand(&path, &self.root))))
            .collect();

        let record = ExtensionRecord {
            name: name.to_string(),
            version: version.to_string(),
            alias,
            bootstrap,
        };

        if self.extensions.insert(name.to_string(), record).is_some() {
            debug!("Replaced extension record of {}", name);
        } else {
            debug!("Added extension record of {}", name);
        }
    }

    /// Record a package using its autoload declarations and `extra` section.
    pub fn add_package(&mut self, package: &PackageInfo) {
        let aliases = derive_aliases(&self.root, package);
        let alias = if aliases.is_empty() {
            None
        } else {
            Some(aliases)
        };
        let bootstrap = package.extra_str(EXTRA_BOOTSTRAP).map(String::from);

        self.add(&package.name, &package.version, alias, bootstrap);
    }

    /// Remove the record of `name`, if any.
    pub fn remove(&mut self, name: &str) -> Option<ExtensionRecord> {
        let removed = self.extensions.remove(name);
        if removed.is_some() {
            debug!("Removed extension record of {}", name);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionRecord> {
        self.extensions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtensionRecord)> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Serialize the registry, with root-relative placeholders, and replace
    /// the manifest atomically.
    #[tracing::instrument(skip(self), fields(path = ?self.manifest_path))]
    pub fn save(&self) -> Result<()> {
        let persisted: BTreeMap<&String, ExtensionRecord> = self
            .extensions
            .iter()
            .map(|(name, record)| {
                let mut record = record.clone();
                for path in record.alias.values_mut() {
                    *path = collapse(path, &self.root);
                }
                (name, record)
            })
            .collect();

        let mut content = serde_json::to_string_pretty(&persisted)?;
        content.push('\n');

        write_atomically(self.runtime, &self.manifest_path, content.as_bytes())?;
        debug!(
            "Saved {} extension(s) to {:?}",
            persisted.len(),
            self.manifest_path
        );
        Ok(())
    }
}

/// Write `contents` to a sibling temporary file, then rename it over `path`.
fn write_atomically<R: Runtime>(runtime: &R, path: &Path, contents: &[u8]) -> Result<()> {
    let write_error = |source: anyhow::Error| ManifestError::Write {
        path: path.to_path_buf(),
        source: source.into(),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !runtime.exists(parent)
    {
        runtime.create_dir_all(parent).map_err(write_error)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name));

    runtime.write(&tmp_path, contents).map_err(write_error)?;

    if let Err(e) = runtime.rename(&tmp_path, path) {
        if let Err(cleanup) = runtime.remove_file(&tmp_path) {
            warn!("Failed to remove temporary manifest {:?}: {}", tmp_path, cleanup);
        }
        return Err(write_error(e).into());
    }

    Ok(())
}
