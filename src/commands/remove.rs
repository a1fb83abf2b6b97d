use anyhow::Result;
use std::path::PathBuf;

use crate::{config::Settings, registry::ExtensionRegistry, runtime::Runtime};

/// Remove an extension from the manifest
#[tracing::instrument(skip(runtime, install_root))]
pub fn remove<R: Runtime>(runtime: R, install_root: Option<PathBuf>, name: &str) -> Result<()> {
    let settings = Settings::resolve(&runtime, install_root)?;
    let mut registry = ExtensionRegistry::load(&runtime, &settings.root, &settings.manifest_path)?;

    if registry.remove(name).is_none() {
        println!("{} is not registered.", name);
        return Ok(());
    }

    registry.save()?;
    println!("Removed {}", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use tempfile::tempdir;

    #[test]
    fn test_remove_unknown_does_not_write() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        runtime.expect_write().never();
        runtime.expect_rename().never();

        remove(runtime, Some(PathBuf::from("/app/vendor")), "acme/widgets").unwrap();
    }

    #[test]
    fn test_remove_registered() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("yiisoft").join("extensions.json");
        std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std::fs::write(
            &manifest,
            r#"{"acme/widgets": {"name": "acme/widgets", "version": "1.0.0.0"},
                "acme/theme": {"name": "acme/theme", "version": "2.0.0.0"}}"#,
        )
        .unwrap();

        remove(RealRuntime, Some(dir.path().to_path_buf()), "acme/widgets").unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&manifest).unwrap()).unwrap();
        assert!(doc.get("acme/widgets").is_none());
        assert_eq!(doc["acme/theme"]["version"], "2.0.0.0");
    }
}
