//! Where changelog documents come from.

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// File name of the upgrade notes inside a package directory.
pub const UPGRADE_FILE: &str = "UPGRADE.md";

/// Supplies the raw changelog text of a package.
#[cfg_attr(test, mockall::automock)]
pub trait ChangelogSource {
    /// The changelog of `package`, or `None` if it is unavailable.
    fn changelog(&self, package: &str) -> Option<String>;
}

/// Reads `<root>/<package>/UPGRADE.md` from the installation root.
pub struct FileChangelogSource<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
    file_name: String,
}

impl<'a, R: Runtime> FileChangelogSource<'a, R> {
    pub fn new(runtime: &'a R, root: &Path) -> Self {
        Self {
            runtime,
            root: root.to_path_buf(),
            file_name: UPGRADE_FILE.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    pub fn path_for(&self, package: &str) -> PathBuf {
        self.root.join(package).join(&self.file_name)
    }
}

impl<R: Runtime> ChangelogSource for FileChangelogSource<'_, R> {
    #[tracing::instrument(skip(self))]
    fn changelog(&self, package: &str) -> Option<String> {
        let path = self.path_for(package);
        if !self.runtime.is_file(&path) {
            debug!("Changelog {:?} does not exist", path);
            return None;
        }

        match self.runtime.read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!("Failed to read changelog {:?}: {}", path, e);
                None
            }
        }
    }
}
