//! Loader strategies that turn an extension artifact into a live instance.
//!
//! The default strategy loads platform dynamic libraries through
//! `libloading`. Hosts that link their extensions at build time (and the
//! test suite) use [`StaticExtensionLoader`] instead; the manager treats
//! both identically.

use std::collections::HashMap;
use std::path::Path;

use caseflow_extension_sdk::{
    CASEFLOW_EXT_ABI_VERSION, DESCRIPTOR_SYMBOL, Extension, ExtensionDescriptor,
    ExtensionRegistrar,
};
use libloading::{Library, Symbol};
use semver::{Version, VersionReq};

use super::error::LoadError;

/// An instance produced by a loader, together with whatever must stay
/// alive for it to remain valid.
pub struct LoadedExtension {
    // Declared before the library handle so the instance drops first; its
    // code must still be mapped while it is being destroyed.
    pub(crate) extension: Box<dyn Extension>,
    _library: Option<Library>,
}

impl LoadedExtension {
    /// Wrap an instance backed by a dynamic library.
    pub fn with_library(extension: Box<dyn Extension>, library: Library) -> Self {
        Self {
            extension,
            _library: Some(library),
        }
    }

    /// Wrap an instance with no backing library (build-time strategy).
    pub fn new(extension: Box<dyn Extension>) -> Self {
        Self {
            extension,
            _library: None,
        }
    }

    /// The extension instance.
    pub fn extension(&self) -> &dyn Extension {
        self.extension.as_ref()
    }
}

impl std::fmt::Debug for LoadedExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedExtension")
            .field("extension", &self.extension)
            .field("has_library", &self._library.is_some())
            .finish()
    }
}

/// Strategy for producing extension instances from artifacts on disk.
pub trait ExtensionLoader: Send {
    /// File extensions (without the dot) this loader claims as artifacts;
    /// discovery skips everything else.
    fn file_extensions(&self) -> &[&str];

    /// Instantiate the artifact at `path`. The identity is the artifact's
    /// file stem.
    fn load(&self, identity: &str, path: &Path) -> Result<LoadedExtension, LoadError>;
}

/// File extensions for dynamic libraries on the running platform.
fn platform_extensions() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["dylib"]
    } else if cfg!(target_os = "windows") {
        &["dll"]
    } else if cfg!(target_os = "linux") {
        &["so"]
    } else {
        &[]
    }
}

/// Loader for native extensions (.so, .dylib, .dll) via `libloading`.
///
/// The library must export a [`DESCRIPTOR_SYMBOL`] descriptor; the loader
/// checks the ABI version and the descriptor's host version requirement,
/// then collects instances through the descriptor's registration function.
/// When a library registers more than one implementation the first is kept
/// and a warning is emitted.
pub struct NativeExtensionLoader {
    host_version: Version,
}

impl NativeExtensionLoader {
    /// Create a loader reporting this crate's version as the host version.
    pub fn new() -> Self {
        Self {
            host_version: Version::parse(env!("CARGO_PKG_VERSION"))
                .unwrap_or_else(|_| Version::new(0, 0, 0)),
        }
    }

    /// Create a loader reporting a specific host version.
    pub fn with_host_version(host_version: Version) -> Self {
        Self { host_version }
    }
}

impl Default for NativeExtensionLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionLoader for NativeExtensionLoader {
    fn file_extensions(&self) -> &[&str] {
        platform_extensions()
    }

    fn load(&self, identity: &str, path: &Path) -> Result<LoadedExtension, LoadError> {
        if platform_extensions().is_empty() {
            return Err(LoadError::UnsupportedPlatform);
        }
        if !path.is_file() {
            return Err(LoadError::ArtifactMissing {
                identity: identity.to_string(),
                dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            });
        }

        // SAFETY: loading a library runs its initializers; extensions are
        // trusted code the user placed in the extensions directory.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Copy everything out of the descriptor before the symbol borrow
        // ends; the library handle has to move into the returned value.
        let (abi_version, requirement, register) = unsafe {
            let symbol: Symbol<*const ExtensionDescriptor> =
                library
                    .get(DESCRIPTOR_SYMBOL)
                    .map_err(|e| LoadError::MissingDescriptor {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
            let descriptor = &**symbol;
            (
                descriptor.abi_version,
                descriptor.host_requirement().map(str::to_owned),
                descriptor.register,
            )
        };

        if abi_version != CASEFLOW_EXT_ABI_VERSION {
            return Err(LoadError::AbiMismatch {
                expected: CASEFLOW_EXT_ABI_VERSION,
                found: abi_version,
            });
        }

        if let Some(requirement) = requirement {
            let req = VersionReq::parse(&requirement).map_err(|e| LoadError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("invalid host version requirement '{requirement}': {e}"),
            })?;
            if !req.matches(&self.host_version) {
                return Err(LoadError::HostVersion {
                    requirement,
                    host: self.host_version.to_string(),
                });
            }
        }

        let mut registrar = ExtensionRegistrar::new();
        // SAFETY: the descriptor passed the ABI check; the registration
        // function receives an exclusive pointer for the duration of the
        // call.
        unsafe { register(&mut registrar) };

        let mut extensions = registrar.into_extensions();
        if extensions.is_empty() {
            return Err(LoadError::NoExtensions {
                path: path.to_path_buf(),
            });
        }
        if extensions.len() > 1 {
            tracing::warn!(
                "extension library {} registered {} implementations, keeping the first",
                path.display(),
                extensions.len()
            );
        }
        let extension = extensions.swap_remove(0);

        Ok(LoadedExtension::with_library(extension, library))
    }
}

/// Factory producing an extension instance.
pub type ExtensionFactory = Box<dyn Fn() -> Box<dyn Extension> + Send + Sync>;

/// Loader backed by factories registered at build time.
///
/// Identities resolve to factories instead of dynamic libraries; an
/// artifact whose identity has no factory fails to load the way a broken
/// library would. Embedded hosts register their compiled-in extensions
/// here, and the test suite uses it to model arbitrary load outcomes.
pub struct StaticExtensionLoader {
    factories: HashMap<String, ExtensionFactory>,
    file_extensions: Vec<&'static str>,
}

impl StaticExtensionLoader {
    /// Create an empty loader claiming the platform library extensions.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            file_extensions: platform_extensions().to_vec(),
        }
    }

    /// Override the artifact file extensions this loader claims.
    pub fn with_file_extensions(mut self, extensions: &[&'static str]) -> Self {
        self.file_extensions = extensions.to_vec();
        self
    }

    /// Register a factory for an identity (builder form).
    pub fn with_extension<F>(mut self, identity: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        self.register(identity, factory);
        self
    }

    /// Register a factory for an identity.
    pub fn register<F>(&mut self, identity: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        self.factories.insert(identity.into(), Box::new(factory));
    }
}

impl Default for StaticExtensionLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionLoader for StaticExtensionLoader {
    fn file_extensions(&self) -> &[&str] {
        &self.file_extensions
    }

    fn load(&self, identity: &str, path: &Path) -> Result<LoadedExtension, LoadError> {
        match self.factories.get(identity) {
            Some(factory) => Ok(LoadedExtension::new(factory())),
            None => Err(LoadError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("no extension implementation registered for '{identity}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_extension_sdk::CommandNode;

    struct NullExtension;

    impl Extension for NullExtension {
        fn name(&self) -> &str {
            "null"
        }

        fn version(&self) -> &str {
            "0.0.1"
        }

        fn command(&self) -> CommandNode {
            CommandNode::leaf("null", |_| Ok(()))
        }
    }

    #[test]
    fn test_native_loader_claims_platform_extensions() {
        let loader = NativeExtensionLoader::new();

        #[cfg(target_os = "linux")]
        assert_eq!(loader.file_extensions(), &["so"]);

        #[cfg(target_os = "macos")]
        assert_eq!(loader.file_extensions(), &["dylib"]);

        #[cfg(target_os = "windows")]
        assert_eq!(loader.file_extensions(), &["dll"]);
    }

    #[test]
    fn test_native_loader_missing_artifact() {
        let loader = NativeExtensionLoader::new();
        let err = loader
            .load("ghost", Path::new("/nonexistent/ghost.so"))
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::ArtifactMissing { .. } | LoadError::UnsupportedPlatform
        ));
    }

    #[test]
    fn test_static_loader_resolves_factories() {
        let loader = StaticExtensionLoader::new()
            .with_file_extensions(&["ext"])
            .with_extension("null", || Box::new(NullExtension));

        let loaded = loader.load("null", Path::new("/tmp/null.ext")).unwrap();
        assert_eq!(loaded.extension().name(), "null");

        let err = loader
            .load("missing", Path::new("/tmp/missing.ext"))
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidArtifact { .. }));
    }
}
