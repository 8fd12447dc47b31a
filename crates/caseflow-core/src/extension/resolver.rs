//! Reconciles extension command contributions with the host registry.

use caseflow_extension_sdk::Extension;
use serde::Serialize;

use super::error::RegistrationError;
use crate::command::{CommandRegistry, RegisteredCommand};

/// A command name collision: the extension's contribution was not
/// registered because the name was already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandConflict {
    /// Identity of the extension whose contribution was rejected.
    pub extension: String,
    /// Version that extension reported.
    pub version: String,
    /// The contested command name.
    pub command: String,
}

/// Outcome of one registration pass.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Command names added to the registry by this pass.
    pub registered: Vec<String>,
    /// Collisions recorded by this pass.
    pub conflicts: Vec<CommandConflict>,
    /// Contributions rejected as structurally invalid.
    pub errors: Vec<RegistrationError>,
}

/// Register each extension's contribution against the host registry.
///
/// Extensions are processed in the iteration order given (the manager
/// passes load order), so the first claim on a name wins and built-ins —
/// registered before any extension — always win. Existing entries are
/// never replaced.
///
/// Re-running a pass against the same registry is idempotent: a collision
/// with an entry this same extension (identity and version) registered
/// earlier is skipped silently rather than recorded, so dry runs against a
/// disposable registry and repeated passes against the live one report the
/// same conflicts.
///
/// An invalid contribution is recorded in the resolution's error list and
/// does not stop the remaining extensions from registering.
pub fn resolve<'a, I>(extensions: I, registry: &mut CommandRegistry) -> Resolution
where
    I: IntoIterator<Item = (&'a str, &'a dyn Extension)>,
{
    let mut resolution = Resolution::default();

    for (identity, extension) in extensions {
        let node = extension.command();
        if let Err(source) = node.validate() {
            tracing::error!(
                "rejecting command contribution from extension '{}': {}",
                identity,
                source
            );
            resolution.errors.push(RegistrationError::InvalidCommand {
                identity: identity.to_string(),
                source,
            });
            continue;
        }

        let command = node.name().to_string();
        let version = extension.version().to_string();

        if let Some(existing) = registry.get(&command) {
            if let RegisteredCommand::Extension {
                identity: owner,
                version: owner_version,
                ..
            } = existing
            {
                if owner == identity && *owner_version == version {
                    // Our own earlier registration; a repeated pass is not
                    // a conflict.
                    continue;
                }
            }
            resolution.conflicts.push(CommandConflict {
                extension: identity.to_string(),
                version,
                command,
            });
            continue;
        }

        registry.add_extension(node, identity, &version);
        tracing::info!(
            "registered command '{}' from extension '{}'",
            command,
            identity
        );
        resolution.registered.push(command);
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_extension_sdk::CommandNode;

    struct FixedExtension {
        name: &'static str,
        version: &'static str,
        command: &'static str,
    }

    impl Extension for FixedExtension {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> &str {
            self.version
        }

        fn command(&self) -> CommandNode {
            CommandNode::leaf(self.command, |_| Ok(()))
        }
    }

    fn ext(name: &'static str, command: &'static str) -> FixedExtension {
        FixedExtension {
            name,
            version: "1.0.0",
            command,
        }
    }

    #[test]
    fn test_builtin_wins_collision() {
        let mut registry = CommandRegistry::with_builtins(["case"]);
        let a = ext("a", "case");
        let b = ext("b", "case");

        let resolution = resolve(
            [("a", &a as &dyn Extension), ("b", &b as &dyn Extension)],
            &mut registry,
        );

        assert_eq!(resolution.conflicts.len(), 2);
        assert!(resolution.registered.is_empty());
        assert!(registry.get("case").unwrap().is_builtin());
    }

    #[test]
    fn test_first_extension_wins_collision() {
        let mut registry = CommandRegistry::new();
        let a = ext("a", "sync");
        let b = ext("b", "sync");

        let resolution = resolve(
            [("a", &a as &dyn Extension), ("b", &b as &dyn Extension)],
            &mut registry,
        );

        assert_eq!(resolution.registered, vec!["sync"]);
        assert_eq!(resolution.conflicts.len(), 1);
        assert_eq!(resolution.conflicts[0].extension, "b");

        match registry.get("sync").unwrap() {
            RegisteredCommand::Extension { identity, .. } => assert_eq!(identity, "a"),
            RegisteredCommand::Builtin => panic!("expected extension entry"),
        }
    }

    #[test]
    fn test_repeated_pass_is_idempotent() {
        let mut registry = CommandRegistry::with_builtins(["case"]);
        let a = ext("a", "alpha");

        let first = resolve([("a", &a as &dyn Extension)], &mut registry);
        assert_eq!(first.registered, vec!["alpha"]);
        assert!(first.conflicts.is_empty());

        let second = resolve([("a", &a as &dyn Extension)], &mut registry);
        assert!(second.registered.is_empty());
        assert!(second.conflicts.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_invalid_contribution_does_not_stop_batch() {
        let mut registry = CommandRegistry::new();
        let bad = ext("bad", "two words");
        let good = ext("good", "alpha");

        let resolution = resolve(
            [
                ("bad", &bad as &dyn Extension),
                ("good", &good as &dyn Extension),
            ],
            &mut registry,
        );

        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.registered, vec!["alpha"]);
        assert!(registry.contains("alpha"));
        assert!(!registry.contains("two words"));
    }
}
