//! CLI binary for anchor-graph: build and query anchored bipartite graphs from JSON records.

use anchor_core::config::{AnchorConfig, BuildConfig};
use anchor_core::graph::{AnchoredGraph, NodeRef};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "anchor-graph", about = "Anchored bipartite graph builder")]
struct Cli {
    /// Project root directory used for `.anchor/config.toml` (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that builds a graph.
#[derive(Args)]
struct BuildArgs {
    /// JSON file mapping category labels to lists of records
    input: PathBuf,

    /// Root field name (overrides config)
    #[arg(short, long)]
    root: Option<String>,

    /// Branch field name (repeatable, overrides config)
    #[arg(short, long = "branch")]
    branches: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and print every root node with its neighbors
    Build {
        #[command(flatten)]
        build: BuildArgs,

        /// Print node metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the graph and list the nodes of one subtype
    Nodes {
        #[command(flatten)]
        build: BuildArgs,

        /// Subtype (field) name to list
        subtype: String,

        /// Print node metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the graph and show node and edge counts
    Info {
        #[command(flatten)]
        build: BuildArgs,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = AnchorConfig::load(&project_root)?;

    match cli.command {
        Commands::Build { build, json } => cmd_build(&config, build, json),
        Commands::Nodes {
            build,
            subtype,
            json,
        } => cmd_nodes(&config, build, &subtype, json),
        Commands::Info { build } => cmd_info(&config, build),
    }
}

/// Load the input file and build a graph from it.
fn build_from_args(
    config: &AnchorConfig,
    args: &BuildArgs,
) -> Result<(AnchoredGraph, BuildConfig)> {
    let build = config
        .build
        .with_overrides(args.root.as_deref(), &args.branches)?;
    let records = anchor_core::input::load_records(&args.input)?;

    if build.branch_names.is_empty() {
        tracing::warn!("no branch fields configured; the graph will contain only root nodes");
    }

    let branch_names: Vec<&str> = build.branch_names.iter().map(String::as_str).collect();
    let mut graph = AnchoredGraph::with_options(build.options());
    graph
        .build_graph(&records, &build.root_name, &branch_names)
        .with_context(|| format!("failed to build graph from {}", args.input.display()))?;

    tracing::info!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        "graph built from {}",
        args.input.display()
    );
    Ok((graph, build))
}

fn format_node(node: &NodeRef<'_>) -> String {
    let groups: Vec<String> = node.group.iter().map(|g| g.to_string()).collect();
    format!("{} [groups: {}]", node.key(), groups.join(", "))
}

fn print_nodes<'g>(nodes: impl Iterator<Item = NodeRef<'g>>, json: bool) -> Result<()> {
    if json {
        let metadata: Vec<_> = nodes.map(|n| n.metadata()).collect();
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }
    for node in nodes {
        println!("{}", format_node(&node));
        for neighbor in node.neighbors() {
            println!("  - {}", neighbor.key());
        }
    }
    Ok(())
}

fn cmd_build(config: &AnchorConfig, args: BuildArgs, json: bool) -> Result<()> {
    let (graph, build) = build_from_args(config, &args)?;
    match graph.find_nodes_subtype(&build.root_name) {
        Some(roots) => print_nodes(roots, json),
        None => {
            eprintln!("No records found in {}", args.input.display());
            Ok(())
        }
    }
}

fn cmd_nodes(config: &AnchorConfig, args: BuildArgs, subtype: &str, json: bool) -> Result<()> {
    let (graph, _) = build_from_args(config, &args)?;
    match graph.find_nodes_subtype(subtype) {
        Some(nodes) => print_nodes(nodes, json),
        None => {
            eprintln!("No records found in {}", args.input.display());
            Ok(())
        }
    }
}

fn cmd_info(config: &AnchorConfig, args: BuildArgs) -> Result<()> {
    let (graph, build) = build_from_args(config, &args)?;
    let stats = graph.stats();

    println!("Input: {}", args.input.display());
    println!("Root field: {}", build.root_name);
    println!("Branch fields: {}", build.branch_names.join(", "));
    println!("Nodes: {}", stats.total_nodes);
    println!("  Roots: {}", stats.root_nodes);
    println!("Edges: {}", stats.total_edges);
    for (subtype, count) in &stats.subtypes {
        println!("  {}: {}", subtype, count);
    }
    Ok(())
}
