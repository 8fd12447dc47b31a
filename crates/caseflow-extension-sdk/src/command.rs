//! Command contributions.
//!
//! An extension contributes exactly one [`CommandNode`] to the host CLI:
//! either a single leaf command or a named group with nested children.
//! Only the top-level name participates in conflict resolution against the
//! host's registry; nested names are private to the contribution.

use std::fmt;

use crate::error::ExtensionError;

/// Arguments handed to a leaf command when it is invoked.
///
/// The host strips the command path (`caseflow demo greet --name x` invokes
/// the `greet` leaf with `["--name", "x"]`) and passes everything after it
/// through untouched.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    args: Vec<String>,
}

impl CommandContext {
    /// Create a context from raw argument strings.
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    /// All arguments, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Positional argument by index.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Whether a bare flag (e.g. `--verbose`) is present.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value following a `--key value` pair.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == key)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Action executed when a leaf command is invoked.
pub type CommandAction = Box<dyn Fn(&CommandContext) -> Result<(), ExtensionError> + Send + Sync>;

/// Body of a command node: a runnable leaf or a group of children.
pub enum CommandKind {
    /// A runnable command.
    Leaf(CommandAction),
    /// A named group of nested commands.
    Group(Vec<CommandNode>),
}

/// A named, tree-shaped command contribution.
pub struct CommandNode {
    name: String,
    about: Option<String>,
    kind: CommandKind,
}

impl CommandNode {
    /// Create a leaf command with the given action.
    pub fn leaf<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&CommandContext) -> Result<(), ExtensionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            about: None,
            kind: CommandKind::Leaf(Box::new(action)),
        }
    }

    /// Create an empty command group.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            kind: CommandKind::Group(Vec::new()),
        }
    }

    /// Set the one-line help text.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Append a child command. No-op on leaf nodes.
    pub fn with_child(mut self, child: CommandNode) -> Self {
        if let CommandKind::Group(children) = &mut self.kind {
            children.push(child);
        }
        self
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line help text, if set.
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// The node body.
    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Children of a group node; `None` for leaves.
    pub fn children(&self) -> Option<&[CommandNode]> {
        match &self.kind {
            CommandKind::Group(children) => Some(children),
            CommandKind::Leaf(_) => None,
        }
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children()?.iter().find(|c| c.name == name)
    }

    /// Whether this node is a group.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, CommandKind::Group(_))
    }

    /// Run a leaf command.
    ///
    /// Returns `InvalidArguments` when called on a group; groups are
    /// dispatched by the host, one path segment at a time.
    pub fn run(&self, ctx: &CommandContext) -> Result<(), ExtensionError> {
        match &self.kind {
            CommandKind::Leaf(action) => action(ctx),
            CommandKind::Group(_) => Err(ExtensionError::InvalidArguments(format!(
                "'{}' is a command group and cannot be run directly",
                self.name
            ))),
        }
    }

    /// Check structural validity: every name in the tree must be non-empty
    /// and free of whitespace, and sibling names must be unique.
    pub fn validate(&self) -> Result<(), CommandError> {
        if self.name.is_empty() {
            return Err(CommandError::EmptyName);
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(CommandError::InvalidName(self.name.clone()));
        }
        if let CommandKind::Group(children) = &self.kind {
            for (i, child) in children.iter().enumerate() {
                child.validate()?;
                if children[..i].iter().any(|c| c.name == child.name) {
                    return Err(CommandError::DuplicateChild {
                        group: self.name.clone(),
                        child: child.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CommandKind::Leaf(_) => f
                .debug_struct("CommandNode")
                .field("name", &self.name)
                .field("kind", &"leaf")
                .finish(),
            CommandKind::Group(children) => f
                .debug_struct("CommandNode")
                .field("name", &self.name)
                .field("kind", &"group")
                .field("children", &children.len())
                .finish(),
        }
    }
}

/// Structural problems in a command contribution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A node has an empty name.
    #[error("command name is empty")]
    EmptyName,

    /// A node's name contains whitespace.
    #[error("command name '{0}' contains whitespace")]
    InvalidName(String),

    /// Two siblings in a group share a name.
    #[error("group '{group}' declares command '{child}' more than once")]
    DuplicateChild { group: String, child: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_runs_action() {
        let node = CommandNode::leaf("echo", |ctx| {
            if ctx.args().is_empty() {
                Err(ExtensionError::InvalidArguments("nothing to echo".into()))
            } else {
                Ok(())
            }
        });

        let ok = CommandContext::new(vec!["hi".to_string()]);
        assert!(node.run(&ok).is_ok());

        let empty = CommandContext::default();
        assert!(node.run(&empty).is_err());
    }

    #[test]
    fn test_group_cannot_run() {
        let node = CommandNode::group("tools");
        assert!(node.run(&CommandContext::default()).is_err());
    }

    #[test]
    fn test_child_lookup() {
        let node = CommandNode::group("demo")
            .with_child(CommandNode::leaf("greet", |_| Ok(())))
            .with_child(CommandNode::leaf("about", |_| Ok(())));

        assert!(node.child("greet").is_some());
        assert!(node.child("missing").is_none());
        assert_eq!(node.children().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert_eq!(
            CommandNode::leaf("", |_| Ok(())).validate(),
            Err(CommandError::EmptyName)
        );
        assert!(matches!(
            CommandNode::leaf("two words", |_| Ok(())).validate(),
            Err(CommandError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_children() {
        let node = CommandNode::group("demo")
            .with_child(CommandNode::leaf("run", |_| Ok(())))
            .with_child(CommandNode::leaf("run", |_| Ok(())));

        assert!(matches!(
            node.validate(),
            Err(CommandError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn test_validate_descends_into_children() {
        let node =
            CommandNode::group("demo").with_child(CommandNode::leaf("bad name", |_| Ok(())));
        assert!(matches!(node.validate(), Err(CommandError::InvalidName(_))));
    }

    #[test]
    fn test_context_helpers() {
        let ctx = CommandContext::new(vec![
            "--name".to_string(),
            "ada".to_string(),
            "--verbose".to_string(),
        ]);

        assert_eq!(ctx.value_of("--name"), Some("ada"));
        assert!(ctx.has_flag("--verbose"));
        assert!(!ctx.has_flag("--quiet"));
        assert_eq!(ctx.arg(1), Some("ada"));
    }
}
