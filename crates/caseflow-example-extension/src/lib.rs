//! Example caseflow extension.
//!
//! Build this crate and drop the resulting library into the extensions
//! directory:
//!
//! ```text
//! cargo build --release -p caseflow-example-extension
//! cp target/release/libcaseflow_example_extension.so ~/.caseflow/extensions/demo.so
//! ```
//!
//! The CLI then picks it up under the identity `demo`:
//!
//! ```text
//! caseflow extensions list
//! caseflow demo greet --name Ada
//! ```

use caseflow_extension_sdk::prelude::*;

/// Demonstrates a command group with nested leaves and lifecycle hooks.
#[derive(Default)]
pub struct DemoExtension {
    ready: bool,
}

impl Extension for DemoExtension {
    fn name(&self) -> &str {
        "demo"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> Option<&str> {
        Some("Example extension demonstrating the caseflow extension system")
    }

    fn command(&self) -> CommandNode {
        let version = self.version().to_string();
        CommandNode::group("demo")
            .with_about("Example extension commands")
            .with_child(
                CommandNode::leaf("greet", |ctx| {
                    let name = ctx.value_of("--name").unwrap_or("world");
                    println!("Hello, {name}! This is the demo extension.");
                    Ok(())
                })
                .with_about("Say hello"),
            )
            .with_child(
                CommandNode::leaf("about", move |_| {
                    println!("demo extension v{version}");
                    Ok(())
                })
                .with_about("Show extension details"),
            )
    }

    fn initialize(&mut self) -> Result<(), ExtensionError> {
        self.ready = true;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), ExtensionError> {
        self.ready = false;
        Ok(())
    }
}

declare_extension!(DemoExtension::default);
