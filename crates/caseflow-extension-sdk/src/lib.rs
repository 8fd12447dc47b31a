//! Caseflow Extension SDK
//!
//! This SDK provides the types and macros for building caseflow CLI
//! extensions: dynamic libraries the host discovers in its extensions
//! directory and loads at startup, each contributing one command (or
//! command group) to the CLI.
//!
//! # Quick Start
//!
//! ```rust
//! use caseflow_extension_sdk::prelude::*;
//!
//! #[derive(Default)]
//! struct GreeterExtension;
//!
//! impl Extension for GreeterExtension {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn version(&self) -> &str {
//!         "1.0.0"
//!     }
//!
//!     fn description(&self) -> Option<&str> {
//!         Some("Greets people from the command line")
//!     }
//!
//!     fn command(&self) -> CommandNode {
//!         CommandNode::leaf("greet", |ctx| {
//!             let name = ctx.value_of("--name").unwrap_or("world");
//!             println!("Hello, {name}!");
//!             Ok(())
//!         })
//!         .with_about("Say hello")
//!     }
//! }
//!
//! declare_extension!(GreeterExtension::default);
//! ```
//!
//! Build the crate as a `cdylib` and drop the resulting library into
//! `~/.caseflow/extensions`.

pub mod command;
pub mod descriptor;
pub mod error;
#[macro_use]
pub mod macros;
pub mod types;

pub use command::{CommandAction, CommandContext, CommandError, CommandKind, CommandNode};
pub use descriptor::{
    CASEFLOW_EXT_ABI_VERSION, DESCRIPTOR_SYMBOL, ExtensionDescriptor, ExtensionRegistrar,
    RegisterFn,
};
pub use error::{ExtensionError, ExtensionResult};
pub use types::Extension;

/// Prelude module with common imports.
pub mod prelude {
    pub use crate::command::{CommandContext, CommandError, CommandKind, CommandNode};
    pub use crate::declare_extension;
    pub use crate::descriptor::{ExtensionDescriptor, ExtensionRegistrar};
    pub use crate::error::{ExtensionError, ExtensionResult};
    pub use crate::types::Extension;
}
