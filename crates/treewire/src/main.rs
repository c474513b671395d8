//! Treewire CLI
//!
//! Loads a scene file and inspects its tree, resolution plan, resolved slots
//! and input bindings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use treewire::bindings::{self, BindingLog};
use treewire::scene::{LoadedScene, SceneLoader};
use treewire::slots::DynamicSlots;
use treewire_runtime::MemberResolver;

/// Treewire scene inspector
#[derive(Parser, Debug)]
#[command(name = "treewire")]
#[command(about = "Resolve scene slots and replay input bindings", long_about = None)]
struct Args {
    /// Path to the scene file
    scene: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every node with its class
    Tree,
    /// Print the resolution plan for the scene's slots as JSON
    Plan,
    /// Resolve the scene's slots and print the node bound to each
    Resolve,
    /// Dispatch the scene's events through its bindings
    Replay {
        /// Disable bindings matching a wildcard pattern (repeatable)
        #[arg(long)]
        disable: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("treewire=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if args.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    info!("Starting treewire v{}", env!("CARGO_PKG_VERSION"));

    let scene = SceneLoader::load(&args.scene)
        .with_context(|| format!("Failed to load scene from {}", args.scene.display()))?;

    match args.command {
        Command::Tree => print_tree(&scene),
        Command::Plan => print_plan(&scene),
        Command::Resolve => resolve(&scene),
        Command::Replay { disable } => replay(&scene, &disable),
    }
}

fn print_tree(scene: &LoadedScene) -> Result<()> {
    for id in scene.tree.walk() {
        let node = scene.tree.get(id).context("Tree walk returned an unknown node")?;
        let path = scene.tree.path_of(id).context("Tree walk returned an unknown node")?;
        let marker = if scene.tree.is_unique(id) { " (unique)" } else { "" };
        println!("{} [{}]{}", path, node.class, marker);
    }
    Ok(())
}

fn print_plan(scene: &LoadedScene) -> Result<()> {
    let plan = scene.plan();
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn resolve(scene: &LoadedScene) -> Result<()> {
    let plan = scene.plan();
    let resolver = MemberResolver::new(Arc::clone(&scene.classes));
    let mut slots = DynamicSlots::for_plan(&plan);

    resolver
        .resolve_with(&mut slots, scene.owner, &plan, &scene.tree)
        .with_context(|| format!("Failed to resolve slots of '{}'", scene.name()))?;
    info!("Resolved {} slots of '{}'", plan.len(), scene.name());

    for (planned, value) in plan.slots().iter().zip(slots.values()) {
        let node = value.as_ref().context("Resolved slot holds no value")?;
        let path = scene
            .tree
            .path_of(node.id)
            .unwrap_or_else(|| node.name.clone());
        println!("{} -> {} [{}]", planned.descriptor.slot_id, path, node.class);
    }
    Ok(())
}

fn replay(scene: &LoadedScene, disable: &[String]) -> Result<()> {
    let log = BindingLog::new();
    let mut dispatcher = bindings::build_dispatcher(&scene.file.bindings, &log)
        .context("Failed to register bindings")?;
    if !disable.is_empty() {
        let count = bindings::disable_matching(&mut dispatcher, disable);
        info!("Disabled {} bindings", count);
    }

    let steps = bindings::replay(&dispatcher, &log, &scene.file.events);
    for (index, step) in steps.iter().enumerate() {
        let fired = if step.fired.is_empty() {
            "-".to_string()
        } else {
            step.fired.join(", ")
        };
        let outcome = match &step.consumed_by {
            Some(name) => format!("consumed by {}", name),
            None => "unhandled".to_string(),
        };
        println!("#{} {}: fired [{}], {}", index, step.event.kind(), fired, outcome);
    }
    Ok(())
}
