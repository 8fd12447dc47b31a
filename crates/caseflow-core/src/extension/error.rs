//! Error taxonomy for extension loading and command registration.

use std::path::PathBuf;

use caseflow_extension_sdk::CommandError;

/// Why an extension artifact could not be turned into a live instance.
///
/// Variants carry pre-formatted reasons rather than source errors so a load
/// outcome can be both recorded in the failed set and returned to the
/// caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// No artifact with the requested identity exists in the extensions
    /// directory.
    #[error("no extension artifact named '{identity}' in {}", dir.display())]
    ArtifactMissing { identity: String, dir: PathBuf },

    /// The artifact exists but could not be loaded as a library.
    #[error("failed to load extension library {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    /// The library does not export the caseflow descriptor symbol.
    #[error("{} is not a caseflow extension: {reason}", path.display())]
    MissingDescriptor { path: PathBuf, reason: String },

    /// The artifact was built against an incompatible extension ABI.
    #[error("extension ABI version mismatch: host supports {expected}, artifact declares {found}")]
    AbiMismatch { expected: u32, found: u32 },

    /// The artifact requires a host version this binary does not satisfy.
    #[error("extension requires host version {requirement}, but this host is {host}")]
    HostVersion { requirement: String, host: String },

    /// The artifact registered no extension implementation.
    #[error("no extension implementation registered by {}", path.display())]
    NoExtensions { path: PathBuf },

    /// The artifact is not something this loader can instantiate.
    #[error("invalid extension artifact {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    /// The instance was constructed but its `initialize` hook failed.
    #[error("extension '{identity}' initialization failed: {reason}")]
    Initialization { identity: String, reason: String },

    /// Native extensions are not supported on this platform.
    #[error("unsupported platform for native extensions")]
    UnsupportedPlatform,
}

/// Why a loaded extension's command contribution was rejected.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistrationError {
    /// The contributed command tree is structurally invalid.
    #[error("extension '{identity}' contributed an invalid command: {source}")]
    InvalidCommand {
        identity: String,
        #[source]
        source: CommandError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_messages_name_the_artifact() {
        let err = LoadError::ArtifactMissing {
            identity: "alpha".to_string(),
            dir: PathBuf::from("/tmp/ext"),
        };
        let msg = err.to_string();
        assert!(msg.contains("alpha"));
        assert!(msg.contains("/tmp/ext"));
    }

    #[test]
    fn test_load_error_is_cloneable() {
        let err = LoadError::AbiMismatch {
            expected: 1,
            found: 2,
        };
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }
}
