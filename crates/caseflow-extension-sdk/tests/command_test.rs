//! Integration tests for the SDK surface an extension author sees.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use caseflow_extension_sdk::prelude::*;

struct RecorderExtension {
    calls: Arc<AtomicUsize>,
    initialized: bool,
}

impl RecorderExtension {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            initialized: false,
        }
    }
}

impl Extension for RecorderExtension {
    fn name(&self) -> &str {
        "recorder"
    }

    fn version(&self) -> &str {
        "2.1.0"
    }

    fn description(&self) -> Option<&str> {
        Some("Counts how often its command runs")
    }

    fn command(&self) -> CommandNode {
        let calls = self.calls.clone();
        CommandNode::group("recorder")
            .with_about("Recording commands")
            .with_child(CommandNode::leaf("bump", move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .with_child(CommandNode::leaf("fail", |_| {
                Err(ExtensionError::Execution("always fails".into()))
            }))
    }

    fn initialize(&mut self) -> Result<(), ExtensionError> {
        self.initialized = true;
        Ok(())
    }
}

#[test]
fn test_contribution_tree_is_runnable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ext = RecorderExtension::new(calls.clone());
    ext.initialize().unwrap();
    assert!(ext.initialized);

    let node = ext.command();
    assert!(node.is_group());
    assert!(node.validate().is_ok());

    let bump = node.child("bump").unwrap();
    bump.run(&CommandContext::default()).unwrap();
    bump.run(&CommandContext::default()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let fail = node.child("fail").unwrap();
    assert!(fail.run(&CommandContext::default()).is_err());
}

#[test]
fn test_contribution_survives_instance_state() {
    // The command tree is rebuilt on every call; each tree must work.
    let calls = Arc::new(AtomicUsize::new(0));
    let ext = RecorderExtension::new(calls.clone());

    let first = ext.command();
    let second = ext.command();
    first
        .child("bump")
        .unwrap()
        .run(&CommandContext::default())
        .unwrap();
    second
        .child("bump")
        .unwrap()
        .run(&CommandContext::default())
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_registrar_round_trip() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registrar = ExtensionRegistrar::new();
    registrar.register(Box::new(RecorderExtension::new(calls)));

    let extensions = registrar.into_extensions();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].name(), "recorder");
    assert_eq!(extensions[0].version(), "2.1.0");
}
