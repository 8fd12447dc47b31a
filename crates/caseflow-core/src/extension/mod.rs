//! Extension subsystem for the caseflow CLI.
//!
//! Extensions are dynamically loaded modules that contribute commands to
//! the host CLI. The subsystem discovers artifacts in the extensions
//! directory, loads them through a pluggable loader strategy, tracks
//! loaded/failed state, and reconciles contributed command names against
//! the host's command registry.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  ExtensionManager                    │
//! │  - discovery, load/unload/reload lifecycle           │
//! │  - loaded / failed / conflict state                  │
//! └─────────────────────────────────────────────────────┘
//!            │                            │
//!            ▼                            ▼
//! ┌─────────────────────┐      ┌─────────────────────────┐
//! │   ExtensionLoader   │      │   resolver::resolve     │
//! │ Native (libloading) │      │ contributions vs. host  │
//! │ Static (build time) │      │ CommandRegistry         │
//! └─────────────────────┘      └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use caseflow_core::command::CommandRegistry;
//! use caseflow_core::extension::{ExtensionManager, default_extensions_dir};
//!
//! let mut manager = ExtensionManager::new(default_extensions_dir());
//! // Startup path: a bad extension must never take the host down.
//! let _ = manager.load_all(true);
//!
//! let mut registry = CommandRegistry::with_builtins(["case", "pack"]);
//! let resolution = manager.register_commands(&mut registry);
//! for conflict in &resolution.conflicts {
//!     eprintln!("conflict: {}", conflict.command);
//! }
//! ```

pub mod error;
pub mod loader;
pub mod manager;
pub mod resolver;

pub use error::{LoadError, RegistrationError};
pub use loader::{
    ExtensionFactory, ExtensionLoader, LoadedExtension, NativeExtensionLoader,
    StaticExtensionLoader,
};
pub use manager::{ExtensionInfo, ExtensionManager, default_extensions_dir};
pub use resolver::{CommandConflict, Resolution};
