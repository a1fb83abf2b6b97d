//! Alias path handling relative to a relocatable installation root.
//!
//! Alias paths that live inside the installation root are persisted as
//! `<root>/relative/path`, so the manifest stays valid when the whole
//! installation is moved. In memory every alias is an absolute path.

use std::collections::BTreeMap;
use std::path::Path;

use crate::package::PackageInfo;
use crate::runtime::path::{relative_path_from_dir, resolve_relative_path};
use crate::runtime::{is_path_under, normalize_path, to_slash};

/// Token standing in for the installation root inside persisted data.
pub const ROOT_PLACEHOLDER: &str = "<root>";

/// Normalize an alias path: `/` separators, no `.` or `..` components.
pub fn normalize_alias_path(path: &str) -> String {
    to_slash(&normalize_path(Path::new(&path.replace('\\', "/"))))
}

/// Rewrite a path under `root` into its placeholder form.
///
/// Paths outside the root are returned normalized but otherwise unchanged.
pub fn collapse(path: &str, root: &Path) -> String {
    let normalized = normalize_alias_path(path);
    let candidate = Path::new(&normalized);

    if candidate.is_absolute() && is_path_under(candidate, root) {
        let relative = relative_path_from_dir(&normalize_path(root), candidate);
        if let Some(relative) = relative {
            let relative = to_slash(&relative);
            return if relative.is_empty() {
                ROOT_PLACEHOLDER.to_string()
            } else {
                format!("{}/{}", ROOT_PLACEHOLDER, relative)
            };
        }
    }

    normalized
}

/// Resolve a placeholder path against the current `root`.
///
/// Anything without the placeholder prefix is returned unchanged.
pub fn expand(stored: &str, root: &Path) -> String {
    if stored == ROOT_PLACEHOLDER {
        return to_slash(&normalize_path(root));
    }

    match stored.strip_prefix(ROOT_PLACEHOLDER) {
        Some(rest) if rest.starts_with('/') => {
            let relative = rest.trim_start_matches('/');
            to_slash(&resolve_relative_path(root, Path::new(relative)))
        }
        _ => stored.to_string(),
    }
}

/// Compute the default aliases of a package from its autoload declarations.
///
/// A namespace `foo\bar` becomes the alias `@foo/bar`. Relative directories
/// are resolved against `<root>/<package name>`. For psr-0 the namespace path
/// is appended to the directory; for psr-4 the directory is the namespace
/// root itself.
#[tracing::instrument(skip(root, package), fields(package = %package.name))]
pub fn derive_aliases(root: &Path, package: &PackageInfo) -> BTreeMap<String, String> {
    let package_dir = root.join(&package.name);
    let mut aliases = BTreeMap::new();

    let mut insert = |namespace: &str, dir: &str, append_namespace: bool| {
        let name = namespace.trim_matches('\\').replace('\\', "/");
        if name.is_empty() {
            log::debug!(
                "Skipping global namespace mapping {:?} of {}",
                dir,
                package.name
            );
            return;
        }

        let dir = resolve_relative_path(&package_dir, Path::new(&dir.replace('\\', "/")));
        let dir = to_slash(&dir);
        let dir = dir.trim_end_matches('/');
        let path = if append_namespace {
            format!("{}/{}", dir, name)
        } else {
            dir.to_string()
        };

        aliases.insert(format!("@{}", name), normalize_alias_path(&path));
    };

    for (namespace, dir) in &package.autoload.psr0 {
        insert(namespace, dir, true);
    }
    for (namespace, dir) in &package.autoload.psr4 {
        insert(namespace, dir, false);
    }

    aliases
}
