//! Host command registry.
//!
//! The registry maps top-level command names to their implementations and
//! is the single authority on name collisions: whatever was registered
//! first — built-in commands first, then extensions in discovery order —
//! keeps the name. Nothing here ever replaces an existing entry.

use std::collections::BTreeMap;

use caseflow_extension_sdk::CommandNode;

/// A command registered with the host.
#[derive(Debug)]
pub enum RegisteredCommand {
    /// A built-in command; its implementation lives in the host binary.
    Builtin,
    /// A command contributed by an extension.
    Extension {
        /// Identity of the contributing extension (artifact stem).
        identity: String,
        /// Version the extension reported at registration time.
        version: String,
        /// The contributed command tree.
        node: CommandNode,
    },
}

impl RegisteredCommand {
    /// The contributed command tree, for extension entries.
    pub fn node(&self) -> Option<&CommandNode> {
        match self {
            Self::Builtin => None,
            Self::Extension { node, .. } => Some(node),
        }
    }

    /// Whether this entry is a built-in command.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

/// The host's set of registered top-level commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: BTreeMap<String, RegisteredCommand>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-seeded with built-in command names.
    pub fn with_builtins<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.add_builtin(name);
        }
        registry
    }

    /// Register a built-in command name.
    ///
    /// Returns `false` (and leaves the registry untouched) when the name
    /// is already taken.
    pub fn add_builtin(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, RegisteredCommand::Builtin);
        true
    }

    /// Register an extension's command contribution under its top-level
    /// name.
    ///
    /// Returns `false` (and leaves the registry untouched) when the name
    /// is already taken.
    pub fn add_extension(
        &mut self,
        node: CommandNode,
        identity: impl Into<String>,
        version: impl Into<String>,
    ) -> bool {
        let name = node.name().to_string();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(
            name,
            RegisteredCommand::Extension {
                identity: identity.into(),
                version: version.into(),
                node,
            },
        );
        true
    }

    /// Whether a command name is taken.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.entries.get(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All entries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredCommand)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> CommandNode {
        CommandNode::leaf(name, |_| Ok(()))
    }

    #[test]
    fn test_builtin_registration() {
        let mut registry = CommandRegistry::new();
        assert!(registry.add_builtin("case"));
        assert!(!registry.add_builtin("case"));
        assert!(registry.contains("case"));
        assert!(registry.get("case").unwrap().is_builtin());
    }

    #[test]
    fn test_extension_cannot_shadow_builtin() {
        let mut registry = CommandRegistry::with_builtins(["case", "pack"]);
        assert!(!registry.add_extension(node("case"), "rogue", "1.0.0"));
        assert!(registry.get("case").unwrap().is_builtin());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_extension_entry_keeps_origin() {
        let mut registry = CommandRegistry::new();
        assert!(registry.add_extension(node("sync"), "syncer", "0.2.0"));

        match registry.get("sync").unwrap() {
            RegisteredCommand::Extension {
                identity, version, ..
            } => {
                assert_eq!(identity, "syncer");
                assert_eq!(version, "0.2.0");
            }
            RegisteredCommand::Builtin => panic!("expected extension entry"),
        }
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = CommandRegistry::with_builtins(["pack", "case", "graph"]);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["case", "graph", "pack"]);
    }
}
