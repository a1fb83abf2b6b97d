//! Error types for the extension manifest.
//!
//! Everything else in the crate reports through `anyhow`; manifest failures
//! get a concrete type so the host can tell a corrupt manifest apart from an
//! ordinary I/O problem and abort the triggering operation.

use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest exists but could not be read.
    #[error("Extension manifest {path:?} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The manifest was read but is not a valid extension document.
    #[error("Extension manifest {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest could not be written or replaced.
    #[error("Failed to write extension manifest {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_message_names_file() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ManifestError::Corrupt {
            path: PathBuf::from("/app/vendor/yiisoft/extensions.json"),
            source,
        };
        let message = err.to_string();
        assert!(message.contains("extensions.json"));
        assert!(message.contains("corrupt"));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ManifestError::Write {
            path: PathBuf::from("/tmp/x"),
            source: anyhow::anyhow!("disk full").into(),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Write { .. })
        ));
    }
}
