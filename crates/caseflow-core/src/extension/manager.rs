//! Extension manager: discovery, lifecycle and registry state.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use caseflow_extension_sdk::Extension;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::LoadError;
use super::loader::{ExtensionLoader, LoadedExtension, NativeExtensionLoader};
use super::resolver::{self, Resolution};
use crate::command::CommandRegistry;

/// Default extensions directory: `~/.caseflow/extensions`.
pub fn default_extensions_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".caseflow")
        .join("extensions")
}

/// A loaded extension and its bookkeeping.
struct ActiveExtension {
    inner: LoadedExtension,
    path: PathBuf,
    loaded_at: DateTime<Utc>,
}

/// Information about a loaded extension.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionInfo {
    /// Identity (artifact file stem) the extension is tracked under.
    pub identity: String,
    /// Display name reported by the extension.
    pub name: String,
    /// Version reported by the extension.
    pub version: String,
    /// Optional description.
    pub description: Option<String>,
    /// Artifact the instance was loaded from.
    pub path: PathBuf,
    /// When the instance was loaded.
    pub loaded_at: DateTime<Utc>,
}

/// Manages discovery, loading and unloading of CLI extensions from a
/// directory of artifacts.
///
/// Every identity is in exactly one of four states: undiscovered,
/// discovered-but-unloaded, loaded, or failed; the loaded and failed sets
/// never overlap. All operations are synchronous — a host embedding the
/// manager in a long-running process must serialize mutating calls behind
/// its own lock.
pub struct ExtensionManager {
    extensions_dir: PathBuf,
    loader: Box<dyn ExtensionLoader>,
    loaded: HashMap<String, ActiveExtension>,
    // Discovery-order view of `loaded`; command registration iterates this
    // so earlier extensions keep contested names.
    load_order: Vec<String>,
    failed: HashMap<String, LoadError>,
    conflicts: Vec<resolver::CommandConflict>,
}

impl ExtensionManager {
    /// Create a manager over `extensions_dir` with the native loader.
    pub fn new(extensions_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(extensions_dir, Box::new(NativeExtensionLoader::new()))
    }

    /// Create a manager with a custom loading strategy.
    pub fn with_loader(extensions_dir: impl Into<PathBuf>, loader: Box<dyn ExtensionLoader>) -> Self {
        let extensions_dir = extensions_dir.into();
        if let Err(e) = fs::create_dir_all(&extensions_dir) {
            tracing::warn!(
                "could not create extensions directory {}: {}",
                extensions_dir.display(),
                e
            );
        }
        Self {
            extensions_dir,
            loader,
            loaded: HashMap::new(),
            load_order: Vec::new(),
            failed: HashMap::new(),
            conflicts: Vec::new(),
        }
    }

    /// The directory scanned for extension artifacts.
    pub fn extensions_dir(&self) -> &Path {
        &self.extensions_dir
    }

    /// List the identities of every addressable artifact in the extensions
    /// directory.
    ///
    /// Entries whose stem starts with `__` are treated as private and
    /// skipped, as are files the active loader does not claim. The result
    /// follows directory-enumeration order, which is platform dependent —
    /// callers must not rely on it being stable.
    pub fn discover(&self) -> Vec<String> {
        let mut identities = Vec::new();

        let entries = match fs::read_dir(&self.extensions_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(
                    "extensions directory {} is not readable: {}",
                    self.extensions_dir.display(),
                    e
                );
                return identities;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !self.loader.file_extensions().contains(&ext) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with("__") {
                continue;
            }
            identities.push(stem.to_string());
        }

        tracing::debug!(
            "discovered {} extension artifact(s) in {}",
            identities.len(),
            self.extensions_dir.display()
        );
        identities
    }

    /// Resolve an identity to its artifact path.
    fn artifact_path(&self, identity: &str) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.extensions_dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !self.loader.file_extensions().contains(&ext) {
                continue;
            }
            if path.file_stem().and_then(|s| s.to_str()) == Some(identity) {
                return Some(path);
            }
        }
        None
    }

    /// Load a single extension by identity.
    ///
    /// Loading is memoized: if the identity is already loaded the cached
    /// instance is returned and no hook runs again. On failure the outcome
    /// is recorded in the failed set and the error is returned; callers on
    /// the batch path may choose to continue.
    pub fn load(&mut self, identity: &str) -> Result<&dyn Extension, LoadError> {
        if self.loaded.contains_key(identity) {
            return Ok(self.loaded[identity].inner.extension());
        }

        match self.try_load(identity) {
            Ok(active) => {
                // A stale failure from an earlier attempt is superseded.
                self.failed.remove(identity);
                self.load_order.push(identity.to_string());
                let entry = self.loaded.entry(identity.to_string()).or_insert(active);
                Ok(entry.inner.extension())
            }
            Err(err) => {
                tracing::error!("failed to load extension '{}': {}", identity, err);
                self.failed.insert(identity.to_string(), err.clone());
                Err(err)
            }
        }
    }

    fn try_load(&self, identity: &str) -> Result<ActiveExtension, LoadError> {
        let path = self
            .artifact_path(identity)
            .ok_or_else(|| LoadError::ArtifactMissing {
                identity: identity.to_string(),
                dir: self.extensions_dir.clone(),
            })?;

        let mut loaded = self.loader.load(identity, &path)?;

        if let Err(e) = loaded.extension.initialize() {
            // The instance never becomes visible; dropping it here also
            // releases the library handle.
            return Err(LoadError::Initialization {
                identity: identity.to_string(),
                reason: e.to_string(),
            });
        }

        tracing::info!(
            "loaded extension '{}' ({} v{})",
            identity,
            loaded.extension.name(),
            loaded.extension.version()
        );

        Ok(ActiveExtension {
            inner: loaded,
            path,
            loaded_at: Utc::now(),
        })
    }

    /// Load every discovered extension.
    ///
    /// With `ignore_errors` set, a failing extension is recorded and the
    /// batch continues; otherwise the first failure aborts the batch and
    /// is returned.
    pub fn load_all(&mut self, ignore_errors: bool) -> Result<(), LoadError> {
        for identity in self.discover() {
            if let Err(err) = self.load(&identity) {
                if !ignore_errors {
                    return Err(err);
                }
                tracing::warn!("skipping failed extension '{}'", identity);
            }
        }
        Ok(())
    }

    /// Unload an extension, running its `cleanup` hook.
    ///
    /// Cleanup errors are logged and swallowed. No-op when the identity is
    /// not loaded.
    pub fn unload(&mut self, identity: &str) {
        if let Some(mut active) = self.loaded.remove(identity) {
            if let Err(e) = active.inner.extension.cleanup() {
                tracing::warn!("extension '{}' cleanup failed: {}", identity, e);
            }
            self.load_order.retain(|n| n != identity);
            tracing::info!("unloaded extension '{}'", identity);
        }
    }

    /// Unload every loaded extension. Order is unspecified.
    pub fn unload_all(&mut self) {
        for identity in std::mem::take(&mut self.load_order) {
            if let Some(mut active) = self.loaded.remove(&identity) {
                if let Err(e) = active.inner.extension.cleanup() {
                    tracing::warn!("extension '{}' cleanup failed: {}", identity, e);
                }
            }
        }
    }

    /// Reload an extension from disk.
    ///
    /// Unloads the current instance if there is one, clears any stale
    /// failure, and loads fresh. Dropping the old instance releases its
    /// library handle, so the artifact is re-read rather than served from
    /// the already-mapped image.
    pub fn reload(&mut self, identity: &str) -> Result<&dyn Extension, LoadError> {
        self.unload(identity);
        self.failed.remove(identity);
        self.load(identity)
    }

    /// Whether an identity is currently loaded.
    pub fn is_loaded(&self, identity: &str) -> bool {
        self.loaded.contains_key(identity)
    }

    /// The loaded instance for an identity, if any.
    pub fn get(&self, identity: &str) -> Option<&dyn Extension> {
        self.loaded.get(identity).map(|a| a.inner.extension())
    }

    /// Identities of loaded extensions, in the order they were loaded.
    pub fn loaded_identities(&self) -> &[String] {
        &self.load_order
    }

    /// Information about every loaded extension, in load order.
    pub fn extension_info(&self) -> Vec<ExtensionInfo> {
        self.load_order
            .iter()
            .filter_map(|identity| {
                let active = self.loaded.get(identity)?;
                let ext = active.inner.extension();
                Some(ExtensionInfo {
                    identity: identity.clone(),
                    name: ext.name().to_string(),
                    version: ext.version().to_string(),
                    description: ext.description().map(str::to_string),
                    path: active.path.clone(),
                    loaded_at: active.loaded_at,
                })
            })
            .collect()
    }

    /// Extensions that failed to load, as identity → error message.
    pub fn failed_extensions(&self) -> BTreeMap<String, String> {
        self.failed
            .iter()
            .map(|(identity, err)| (identity.clone(), err.to_string()))
            .collect()
    }

    /// Conflicts recorded by the most recent registration pass.
    pub fn command_conflicts(&self) -> &[resolver::CommandConflict] {
        &self.conflicts
    }

    /// Register every loaded extension's command contribution with the
    /// host registry.
    ///
    /// Contributions are processed in load order; a name that is already
    /// registered — built-in or earlier extension — is recorded as a
    /// conflict and skipped, never overwritten. The conflict snapshot is
    /// replaced on every pass. Invalid contributions are returned in the
    /// resolution's error list without aborting the rest of the batch.
    pub fn register_commands(&mut self, registry: &mut CommandRegistry) -> Resolution {
        let extensions = self.load_order.iter().filter_map(|identity| {
            self.loaded
                .get(identity)
                .map(|a| (identity.as_str(), a.inner.extension()))
        });
        let resolution = resolver::resolve(extensions, registry);

        for conflict in &resolution.conflicts {
            tracing::warn!(
                "extension '{}' command '{}' conflicts with an existing command",
                conflict.extension,
                conflict.command
            );
        }
        self.conflicts = resolution.conflicts.clone();
        resolution
    }
}

impl Drop for ExtensionManager {
    // Process teardown counts as unloading: every live instance gets its
    // cleanup call.
    fn drop(&mut self) {
        self.unload_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::loader::StaticExtensionLoader;
    use caseflow_extension_sdk::CommandNode;

    struct StubExtension;

    impl Extension for StubExtension {
        fn name(&self) -> &str {
            "stub"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn command(&self) -> CommandNode {
            CommandNode::leaf("stub", |_| Ok(()))
        }
    }

    fn test_loader() -> Box<StaticExtensionLoader> {
        Box::new(
            StaticExtensionLoader::new()
                .with_file_extensions(&["ext"])
                .with_extension("stub", || Box::new(StubExtension)),
        )
    }

    #[test]
    fn test_constructor_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("extensions");
        let manager = ExtensionManager::with_loader(&dir, test_loader());

        assert!(dir.exists());
        assert_eq!(manager.extensions_dir(), dir);
        assert!(manager.extension_info().is_empty());
        assert!(manager.failed_extensions().is_empty());
    }

    #[test]
    fn test_discover_skips_private_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ExtensionManager::with_loader(tmp.path(), test_loader());

        fs::write(tmp.path().join("stub.ext"), b"").unwrap();
        fs::write(tmp.path().join("other.ext"), b"").unwrap();
        fs::write(tmp.path().join("__private.ext"), b"").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(tmp.path().join("subdir.ext")).unwrap();

        let mut discovered = manager.discover();
        discovered.sort();
        assert_eq!(discovered, vec!["other", "stub"]);
    }

    #[test]
    fn test_discover_missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("extensions");
        let manager = ExtensionManager::with_loader(&dir, test_loader());
        fs::remove_dir(&dir).unwrap();

        assert!(manager.discover().is_empty());
    }

    #[test]
    fn test_load_unknown_identity_is_artifact_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manager = ExtensionManager::with_loader(tmp.path(), test_loader());

        let err = manager.load("ghost").unwrap_err();
        assert!(matches!(err, LoadError::ArtifactMissing { .. }));
        assert!(manager.failed_extensions().contains_key("ghost"));
    }

    #[test]
    fn test_default_extensions_dir_is_under_home() {
        let dir = default_extensions_dir();
        assert!(dir.ends_with(Path::new(".caseflow").join("extensions")));
    }
}
