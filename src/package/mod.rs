//! Package metadata handed over by the host package manager.
//!
//! The host owns resolution and installation; it describes each package it
//! touches with a [`PackageInfo`], and this crate reads only the fields it
//! needs from it.

mod version;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use version::{NumericVersion, VersionKind, VersionShape, VersionToken, classify};

/// Autoload declarations of a package: namespace prefix → directory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Autoload {
    #[serde(rename = "psr-0", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub psr0: BTreeMap<String, String>,
    #[serde(rename = "psr-4", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub psr4: BTreeMap<String, String>,
}

impl Autoload {
    pub fn is_empty(&self) -> bool {
        self.psr0.is_empty() && self.psr4.is_empty()
    }
}

/// Package metadata as exposed by the host.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    /// Normalized version, e.g. `2.0.13.0` or `9999999-dev`.
    pub version: String,
    /// Version as the user wrote it, e.g. `2.0.13` or `dev-master`.
    #[serde(default)]
    pub pretty_version: String,
    #[serde(rename = "type", default)]
    pub package_type: String,
    #[serde(default)]
    pub autoload: Autoload,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageInfo {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            pretty_version: version.to_string(),
            ..Default::default()
        }
    }

    /// The version shown to users; falls back to the normalized one.
    pub fn display_version(&self) -> &str {
        if self.pretty_version.is_empty() {
            &self.version
        } else {
            &self.pretty_version
        }
    }

    /// A string entry of the package's `extra` section.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}
