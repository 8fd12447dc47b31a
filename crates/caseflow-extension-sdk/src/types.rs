//! The extension trait every caseflow extension implements.

use crate::command::CommandNode;
use crate::error::ExtensionError;

/// Trait implemented by every caseflow extension.
///
/// An extension contributes one command (or command group) to the host CLI
/// and may hold state across its lifecycle: the host constructs the
/// instance, calls [`initialize`](Extension::initialize) exactly once, and
/// calls [`cleanup`](Extension::cleanup) exactly once when the extension is
/// unloaded.
///
/// The `name` reported here is the extension's display name and may differ
/// from its identity (the artifact file stem) under which the host tracks
/// it.
pub trait Extension: Send + Sync {
    /// Display name of the extension.
    fn name(&self) -> &str;

    /// Extension version (semver string).
    fn version(&self) -> &str;

    /// Optional one-line description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// The command contribution.
    ///
    /// Called by the host during command registration; the top-level name
    /// of the returned node is the one checked for conflicts.
    fn command(&self) -> CommandNode;

    /// Called once, immediately after the instance is constructed.
    ///
    /// An error here aborts the load; the instance is dropped and never
    /// becomes visible to the host.
    fn initialize(&mut self) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Called once when the extension is unloaded.
    ///
    /// Errors are logged by the host, never propagated.
    fn cleanup(&mut self) -> Result<(), ExtensionError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Extension + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}
