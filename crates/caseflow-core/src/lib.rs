//! Core library for the caseflow CLI.
//!
//! This crate hosts the extension subsystem — discovery, dynamic loading,
//! lifecycle and command-conflict resolution — and the host command
//! registry extensions register into. The CLI binary and any embedding
//! host build on these pieces; the remote-platform client commands
//! themselves live with the host, not here.

pub mod command;
pub mod extension;

pub use command::{CommandRegistry, RegisteredCommand};
pub use extension::{
    CommandConflict, ExtensionInfo, ExtensionManager, LoadError, RegistrationError, Resolution,
};
