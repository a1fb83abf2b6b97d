use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{
    config::Settings,
    registry::{ExtensionRegistry, ROOT_PLACEHOLDER},
    runtime::{Runtime, path::resolve_relative_path, to_slash},
};

/// Parse an `@NAME=PATH` alias argument.
pub fn parse_alias(arg: &str) -> Result<(String, String)> {
    let Some((name, path)) = arg.split_once('=') else {
        bail!("Invalid alias '{}': expected @NAME=PATH", arg);
    };
    let name = name.trim();
    let path = path.trim();
    if !name.starts_with('@') || name.len() < 2 {
        bail!("Invalid alias name '{}': must start with '@'", name);
    }
    if path.is_empty() {
        bail!("Invalid alias '{}': path is empty", arg);
    }
    Ok((name.to_string(), path.to_string()))
}

/// Register or replace an extension by hand
#[tracing::instrument(skip(runtime, install_root))]
pub fn add<R: Runtime>(
    runtime: R,
    install_root: Option<PathBuf>,
    name: &str,
    version: &str,
    aliases: &[String],
    bootstrap: Option<String>,
) -> Result<()> {
    let settings = Settings::resolve(&runtime, install_root)?;

    let mut alias = BTreeMap::new();
    for arg in aliases {
        let (key, path) = parse_alias(arg)?;
        alias.insert(key, absolutize(&settings.root, &path));
    }

    let mut registry = ExtensionRegistry::load(&runtime, &settings.root, &settings.manifest_path)?;
    let replaced = registry.get(name).is_some();
    registry.add(name, version, Some(alias), bootstrap);
    registry.save()?;

    if replaced {
        println!("Updated {} {}", name, version);
    } else {
        println!("Registered {} {}", name, version);
    }
    Ok(())
}

/// Relative paths are taken relative to the installation root.
fn absolutize(root: &Path, path: &str) -> String {
    if path.starts_with(ROOT_PLACEHOLDER) || Path::new(path).is_absolute() {
        return path.to_string();
    }
    to_slash(&resolve_relative_path(root, Path::new(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    #[test]
    fn test_parse_alias() {
        assert_eq!(
            parse_alias("@acme/widgets=/srv/widgets").unwrap(),
            ("@acme/widgets".to_string(), "/srv/widgets".to_string())
        );
        assert_eq!(
            parse_alias("@app = <root>/app").unwrap(),
            ("@app".to_string(), "<root>/app".to_string())
        );
    }

    #[test]
    fn test_parse_alias_invalid() {
        assert!(parse_alias("@acme/widgets").is_err());
        assert!(parse_alias("acme=/srv").is_err());
        assert!(parse_alias("@=/srv").is_err());
        assert!(parse_alias("@acme=").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_absolutize() {
        let root = Path::new("/app/vendor");
        assert_eq!(absolutize(root, "acme/src"), "/app/vendor/acme/src");
        assert_eq!(absolutize(root, "/srv/src"), "/srv/src");
        assert_eq!(absolutize(root, "<root>/acme"), "<root>/acme");
    }

    #[test]
    fn test_add_persists_placeholder() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();

        add(
            RealRuntime,
            Some(root.clone()),
            "acme/widgets",
            "1.0.0.0",
            &["@acme/widgets=acme/widgets/src".to_string()],
            Some("acme\\widgets\\Bootstrap".to_string()),
        )
        .unwrap();

        let content =
            std::fs::read_to_string(root.join("yiisoft").join("extensions.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&content).unwrap();
        let record = &doc["acme/widgets"];
        assert_eq!(record["version"], "1.0.0.0");
        assert_eq!(record["alias"]["@acme/widgets"], "<root>/acme/widgets/src");
        assert_eq!(record["bootstrap"], "acme\\widgets\\Bootstrap");
    }

    #[test]
    fn test_add_rejects_bad_alias() {
        let dir = tempdir().unwrap();
        let result = add(
            RealRuntime,
            Some(dir.path().to_path_buf()),
            "acme/widgets",
            "1.0.0.0",
            &["widgets".to_string()],
            None,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("yiisoft").exists());
    }
}
