// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, EngineSection, default_config_path, load_and_validate};
use crate::dag::Graph;
use crate::engine::{Run, RunOptions, RunReport};
use crate::errors::NodeflowError;
use crate::exec::{LocalExecutor, NodeExecutor, TimeoutExecutor};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (optional when the default path is absent)
/// - CLI overrides on top of `[engine]`
/// - the selected demo graph
/// - the executor, wrapped in a deadline when `node_timeout` is set
/// - one engine run
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let settings = apply_overrides(cfg.engine, &args);

    let graph = demo::build(args.demo).map_err(NodeflowError::from)?;

    if args.dry_run {
        print_dry_run(&graph, &settings);
        return Ok(());
    }

    let report = execute(graph, &settings).await?;

    info!(
        demo = ?args.demo,
        executions = report.executions(),
        max_in_flight = report.max_in_flight,
        "run finished"
    );
    Ok(())
}

/// Run `graph` once with the executor and limits from `settings`.
async fn execute(graph: Graph, settings: &EngineSection) -> errors::Result<RunReport> {
    let local = LocalExecutor::default();
    let executor: Arc<dyn NodeExecutor> = match settings.node_timeout {
        Some(limit) => Arc::new(TimeoutExecutor::new(local, limit)),
        None => Arc::new(local),
    };

    let options = RunOptions::default().with_concurrency(settings.concurrency);
    Ok(Run::new(Arc::new(graph), executor, options).run().await?)
}

/// Load the config named on the command line, or the default one if it
/// exists. Without either, built-in defaults apply.
fn resolve_config(args: &CliArgs) -> errors::Result<ConfigFile> {
    let path: PathBuf = match &args.config {
        Some(path) => path.clone(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(ConfigFile::default());
            }
            path
        }
    };

    info!(path = %path.display(), "loading config");
    load_and_validate(&path)
}

fn apply_overrides(mut engine: EngineSection, args: &CliArgs) -> EngineSection {
    if let Some(concurrency) = args.concurrency {
        engine.concurrency = concurrency;
    }
    if let Some(limit) = args.node_timeout {
        engine.node_timeout = Some(limit);
    }
    engine
}

/// Print nodes, edges and derived data without executing anything.
fn print_dry_run(graph: &Graph, settings: &EngineSection) {
    println!("nodeflow dry-run");
    println!("  engine.concurrency = {}", settings.concurrency);
    match settings.node_timeout {
        Some(limit) => println!("  engine.node_timeout = {limit:?}"),
        None => println!("  engine.node_timeout = none"),
    }
    println!();

    println!("nodes ({}):", graph.len());
    for entry in graph.nodes() {
        println!("  - {} {}", entry.id, entry.type_name());
        println!("      output: {}", entry.output_kind());
        println!("      static: {}", graph.is_node_static(entry.id));
        println!("      distance_from_end: {}", graph.distance_from_end(entry.id));
        for (slot, value) in graph.slot_defaults(entry.id) {
            println!("      default {slot} = {value}");
        }
    }

    println!("edges:");
    for edge in graph.edges() {
        println!("  - {} {} -> {}.{}", edge.id, edge.from, edge.to, edge.slot);
    }
    println!("sources: {:?}", graph.source_nodes());

    debug!("dry-run complete (no execution)");
}
