//! Command-line interface for caseflow.
//!
//! Built-in subcommands are defined here; everything else is looked up in
//! the host command registry, which extensions populate at startup. A
//! broken extension is reported through `caseflow extensions list` and
//! never prevents the built-in commands from running.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow, bail};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use caseflow_core::command::{CommandRegistry, RegisteredCommand};
use caseflow_core::extension::{ExtensionManager, default_extensions_dir};
use caseflow_extension_sdk::{CommandContext, CommandKind, CommandNode};

/// Caseflow - command line interface for case and automation operations.
#[derive(Parser, Debug)]
#[command(name = "caseflow")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Extensions directory to use instead of the default.
    #[arg(long, global = true, value_name = "DIR")]
    extensions_dir: Option<PathBuf>,
}

/// Built-in commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Manage caseflow extensions.
    Extensions {
        #[command(subcommand)]
        cmd: ExtensionsCommand,
    },
    /// A command contributed by an extension.
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Extension management subcommands.
#[derive(Subcommand, Debug)]
enum ExtensionsCommand {
    /// List discovered, loaded and failed extensions.
    List {
        /// Show detailed information.
        #[arg(short, long)]
        verbose: bool,
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show information about one extension.
    Info {
        /// Extension identity (artifact file stem).
        identity: String,
    },
    /// Reload an extension from disk.
    Reload {
        /// Extension identity (artifact file stem).
        identity: String,
    },
    /// Load every discovered extension and report problems.
    Validate,
    /// Report command-name conflicts against the built-in commands.
    CheckConflicts,
    /// Scaffold a new extension crate.
    Create {
        /// Extension name (lowercase, hyphens only).
        name: String,
        /// Directory to create the crate in (defaults to ./<name>).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the extensions directory.
    Dir,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let dir = args
        .extensions_dir
        .clone()
        .unwrap_or_else(default_extensions_dir);

    match args.command {
        Command::Extensions { cmd } => run_extensions_cmd(cmd, &dir),
        Command::External(argv) => run_extension_command(&dir, &argv),
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();
}

/// The host's command registry, seeded with every built-in top-level
/// command before extensions register.
fn host_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for sub in Args::command().get_subcommands() {
        registry.add_builtin(sub.get_name().to_string());
    }
    registry.add_builtin("help");
    registry
}

/// Load all extensions, tolerating failures (startup path).
fn load_manager(dir: &Path) -> ExtensionManager {
    let mut manager = ExtensionManager::new(dir);
    // ignore_errors: a bad extension must not take the CLI down.
    let _ = manager.load_all(true);
    manager
}

/// Dispatch an unrecognized top-level command through the extension
/// registry.
fn run_extension_command(dir: &Path, argv: &[String]) -> Result<()> {
    let Some((name, rest)) = argv.split_first() else {
        bail!("no command given");
    };

    let mut manager = load_manager(dir);
    let mut registry = host_registry();
    let resolution = manager.register_commands(&mut registry);
    for err in &resolution.errors {
        tracing::warn!("{}", err);
    }

    match registry.get(name) {
        Some(RegisteredCommand::Extension { node, .. }) => dispatch_node(node, rest),
        _ => bail!(
            "unrecognized command '{}'; run 'caseflow extensions list' to see extension commands",
            name
        ),
    }
}

/// Walk a contributed command tree, one path segment at a time.
fn dispatch_node(node: &CommandNode, args: &[String]) -> Result<()> {
    match node.kind() {
        CommandKind::Leaf(_) => node
            .run(&CommandContext::new(args.to_vec()))
            .map_err(|e| anyhow!("command '{}' failed: {}", node.name(), e)),
        CommandKind::Group(children) => {
            let Some((sub, rest)) = args.split_first() else {
                println!("'{}' is a command group.", node.name());
                println!();
                println!("Commands:");
                for child in children {
                    println!("  {:<14} {}", child.name(), child.about().unwrap_or_default());
                }
                return Ok(());
            };
            match node.child(sub) {
                Some(child) => dispatch_node(child, rest),
                None => bail!("unknown subcommand '{}' for '{}'", sub, node.name()),
            }
        }
    }
}

fn run_extensions_cmd(cmd: ExtensionsCommand, dir: &Path) -> Result<()> {
    match cmd {
        ExtensionsCommand::List { verbose, json } => run_list(dir, verbose, json),
        ExtensionsCommand::Info { identity } => run_info(dir, &identity),
        ExtensionsCommand::Reload { identity } => run_reload(dir, &identity),
        ExtensionsCommand::Validate => run_validate(dir),
        ExtensionsCommand::CheckConflicts => run_check_conflicts(dir),
        ExtensionsCommand::Create { name, output } => run_create(&name, output),
        ExtensionsCommand::Dir => {
            println!("{}", dir.display());
            Ok(())
        }
    }
}

fn run_list(dir: &Path, verbose: bool, json: bool) -> Result<()> {
    let mut manager = load_manager(dir);

    // Dry-run registration so conflicts are part of the report.
    let mut registry = host_registry();
    let _ = manager.register_commands(&mut registry);

    let discovered = manager.discover();
    let loaded = manager.extension_info();
    let failed = manager.failed_extensions();
    let conflicts = manager.command_conflicts();

    if json {
        let report = serde_json::json!({
            "directory": dir,
            "discovered": discovered,
            "loaded": loaded,
            "failed": failed,
            "conflicts": conflicts,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if discovered.is_empty() {
        println!("No extensions found in {}", dir.display());
        return Ok(());
    }

    println!("Extensions directory: {}", dir.display());
    println!("Discovered {} extension artifact(s)", discovered.len());
    println!();

    if !loaded.is_empty() {
        println!("Loaded Extensions:");
        for info in &loaded {
            if verbose {
                println!("  {}", info.identity);
                println!("    Name: {}", info.name);
                println!("    Version: {}", info.version);
                println!(
                    "    Description: {}",
                    info.description.as_deref().unwrap_or("No description provided")
                );
                println!("    Artifact: {}", info.path.display());
            } else {
                println!("  {} (v{})", info.identity, info.version);
            }
        }
        println!();
    }

    if !failed.is_empty() {
        println!("Failed Extensions:");
        for (identity, error) in &failed {
            if verbose {
                println!("  {}: {}", identity, error);
            } else {
                println!("  {}", identity);
            }
        }
        println!();
    }

    let unloaded: Vec<_> = discovered
        .iter()
        .filter(|id| !manager.is_loaded(id) && !failed.contains_key(id.as_str()))
        .collect();
    if !unloaded.is_empty() {
        println!("Unloaded Extensions:");
        for identity in unloaded {
            println!("  {}", identity);
        }
        println!();
    }

    if !conflicts.is_empty() {
        println!("Command Conflicts:");
        for conflict in conflicts {
            println!(
                "  Extension '{}' command '{}' conflicts with an existing command",
                conflict.extension, conflict.command
            );
            println!("    Extension version: {}", conflict.version);
            println!("    Solution: rename the command or use a command group");
        }
    }

    Ok(())
}

fn run_info(dir: &Path, identity: &str) -> Result<()> {
    let mut manager = ExtensionManager::new(dir);

    let ext = manager
        .load(identity)
        .with_context(|| format!("could not load extension '{}'", identity))?;

    let name = ext.name().to_string();
    let version = ext.version().to_string();
    let description = ext.description().map(str::to_string);
    let node = ext.command();

    println!("Extension Information");
    println!("=====================");
    println!();
    println!("Identity:    {}", identity);
    println!("Name:        {}", name);
    println!("Version:     {}", version);
    println!(
        "Description: {}",
        description.as_deref().unwrap_or("No description provided")
    );
    println!("Command:     {}", node.name());

    if let Some(children) = node.children() {
        let names: Vec<_> = children.iter().map(|c| c.name()).collect();
        if !names.is_empty() {
            println!("Subcommands: {}", names.join(", "));
        }
    }

    if let Err(e) = node.validate() {
        println!();
        println!("Warning: contributed command is invalid: {}", e);
    }

    if let Some(info) = manager.extension_info().into_iter().find(|i| i.identity == identity) {
        println!("Artifact:    {}", info.path.display());
    }

    Ok(())
}

fn run_reload(dir: &Path, identity: &str) -> Result<()> {
    let mut manager = ExtensionManager::new(dir);

    println!("Reloading extension: {}...", identity);
    let ext = manager
        .reload(identity)
        .with_context(|| format!("failed to reload extension '{}'", identity))?;

    println!("Successfully reloaded extension: {}", identity);
    println!("  Name: {}", ext.name());
    println!("  Version: {}", ext.version());
    Ok(())
}

fn run_validate(dir: &Path) -> Result<()> {
    let mut manager = ExtensionManager::new(dir);

    let mut discovered = manager.discover();
    discovered.sort();

    if discovered.is_empty() {
        println!("No extensions found in {}", dir.display());
        return Ok(());
    }

    println!("Validating {} extension(s)...", discovered.len());
    println!();

    let mut all_valid = true;

    for identity in &discovered {
        match manager.load(identity) {
            Ok(ext) => {
                let node = ext.command();
                match node.validate() {
                    Ok(()) => println!("{}: OK", identity),
                    Err(e) => {
                        println!("{}: invalid command contribution: {}", identity, e);
                        all_valid = false;
                    }
                }
            }
            Err(e) => {
                println!("{}: {}", identity, e);
                all_valid = false;
            }
        }
    }

    // Conflicts are checked against a disposable registry seeded with the
    // real built-in commands.
    let mut registry = host_registry();
    let resolution = manager.register_commands(&mut registry);
    if !resolution.conflicts.is_empty() {
        println!();
        println!("Command Conflicts Detected:");
        for conflict in &resolution.conflicts {
            println!(
                "  Extension '{}' command '{}' conflicts with an existing command",
                conflict.extension, conflict.command
            );
        }
        all_valid = false;
    }

    println!();
    if all_valid {
        println!("All extensions are valid.");
        Ok(())
    } else {
        println!("Some extensions have validation problems.");
        std::process::exit(1);
    }
}

fn run_check_conflicts(dir: &Path) -> Result<()> {
    let mut manager = load_manager(dir);

    let mut registry = host_registry();
    let resolution = manager.register_commands(&mut registry);

    if resolution.conflicts.is_empty() {
        println!("No command conflicts detected.");
        println!("All extension commands have unique names.");
        return Ok(());
    }

    println!("Found {} command conflict(s):", resolution.conflicts.len());
    println!();

    for conflict in &resolution.conflicts {
        println!("Extension: {} (v{})", conflict.extension, conflict.version);
        println!("  Command: '{}'", conflict.command);
        let against = match registry.get(&conflict.command) {
            Some(RegisteredCommand::Builtin) => "a built-in command".to_string(),
            Some(RegisteredCommand::Extension { identity, .. }) => {
                format!("extension '{}'", identity)
            }
            None => "an existing command".to_string(),
        };
        println!("  Conflicts with: {}", against);
        println!();
    }

    println!("Solutions:");
    println!("  - Rename the conflicting command in your extension");
    println!("  - Use a command group to namespace your commands");
    Ok(())
}

const SCAFFOLD_MANIFEST: &str = r#"[package]
name = "__NAME__"
version = "0.1.0"
edition = "2021"

[lib]
crate-type = ["cdylib"]

[dependencies]
caseflow-extension-sdk = "0.4"
"#;

const SCAFFOLD_LIB: &str = r#"use caseflow_extension_sdk::prelude::*;

#[derive(Default)]
struct __TYPE__;

impl Extension for __TYPE__ {
    fn name(&self) -> &str {
        "__NAME__"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> Option<&str> {
        Some("A caseflow extension")
    }

    fn command(&self) -> CommandNode {
        CommandNode::group("__COMMAND__")
            .with_about("__NAME__ commands")
            .with_child(
                CommandNode::leaf("hello", |ctx| {
                    let name = ctx.value_of("--name").unwrap_or("world");
                    println!("Hello, {name}!");
                    Ok(())
                })
                .with_about("Say hello"),
            )
    }
}

declare_extension!(__TYPE__::default);
"#;

fn run_create(name: &str, output: Option<PathBuf>) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        bail!(
            "invalid extension name '{}': use lowercase letters, digits and hyphens",
            name
        );
    }

    let target = output.unwrap_or_else(|| PathBuf::from(name));
    if target.exists() {
        bail!("{} already exists", target.display());
    }

    let type_name: String = name
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<String>()
        + "Extension";
    let command_name = name.replace('-', "_");

    fs::create_dir_all(target.join("src"))
        .with_context(|| format!("could not create {}", target.display()))?;
    fs::write(
        target.join("Cargo.toml"),
        SCAFFOLD_MANIFEST.replace("__NAME__", name),
    )?;
    fs::write(
        target.join("src").join("lib.rs"),
        SCAFFOLD_LIB
            .replace("__TYPE__", &type_name)
            .replace("__NAME__", name)
            .replace("__COMMAND__", &command_name),
    )?;

    println!("Created extension scaffold at {}", target.display());
    println!();
    println!("Next steps:");
    println!("  cd {}", target.display());
    println!("  cargo build --release");
    println!(
        "  cp target/release/*.{{so,dylib,dll}} {}",
        default_extensions_dir().display()
    );
    Ok(())
}
