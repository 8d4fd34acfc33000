use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use datasheet_graph::{GraphEngine, GraphError, GraphSession, GraphSettings, NodeKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datasheet-graph")]
#[command(about = "Hierarchy graphs and keyword context for technical datasheets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Graph file (overrides DATASHEET_GRAPH_PATH, default: datasheet_graph.gml)
    #[arg(long, global = true)]
    graph: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph from a docling JSON or Markdown export
    Build(BuildArgs),

    /// Print the graph context for a question
    Query(QueryArgs),

    /// Print node and edge counts as JSON
    Stats,
}

#[derive(Args)]
struct BuildArgs {
    /// Document to build the graph from
    source: PathBuf,
}

#[derive(Args)]
struct QueryArgs {
    /// Keyword or phrase to look up
    question: String,
}

#[derive(Serialize)]
struct StatsOutput {
    graph: String,
    nodes: usize,
    edges: usize,
    sections: usize,
    contents: usize,
    relations: BTreeMap<String, usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut settings = GraphSettings::from_env();
    if let Some(graph) = cli.graph {
        settings = settings.with_graph_path(graph);
    }

    match cli.command {
        Commands::Build(args) => run_build(settings, args),
        Commands::Query(args) => {
            let session = GraphSession::new(settings);
            println!("{}", session.context_for(&args.question));
            Ok(())
        }
        Commands::Stats => run_stats(&settings),
    }
}

fn run_build(settings: GraphSettings, args: BuildArgs) -> Result<()> {
    let session = GraphSession::new(settings);
    match session.build(&args.source) {
        Ok(handle) => {
            println!(
                "Graph built successfully! Saved to {} ({} nodes, {} edges)",
                handle.output_path.display(),
                handle.node_count,
                handle.edge_count
            );
            Ok(())
        }
        Err(err @ GraphError::DocumentNotFound(_)) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("Build failed: {err}");
            std::process::exit(1);
        }
    }
}

fn run_stats(settings: &GraphSettings) -> Result<()> {
    let engine = GraphEngine::load_with_config(&settings.graph_path, settings.query);
    let graph = engine.graph().with_context(|| {
        format!(
            "graph not loaded from {} ({}); run `datasheet-graph build` first",
            settings.graph_path.display(),
            engine.load_error().unwrap_or("unknown error")
        )
    })?;

    let mut relations = BTreeMap::new();
    for (_, _, edge) in graph.edges() {
        *relations
            .entry(edge.relationship.as_str().to_string())
            .or_insert(0) += 1;
    }

    let output = StatsOutput {
        graph: settings.graph_path.display().to_string(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        sections: graph.count_kind(NodeKind::Section),
        contents: graph.count_kind(NodeKind::Content),
        relations,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn graph_flag_is_global() {
        let cli = Cli::parse_from(["datasheet-graph", "query", "GTM", "--graph", "x.gml"]);
        assert_eq!(cli.graph, Some(PathBuf::from("x.gml")));
        assert!(matches!(cli.command, Commands::Query(ref q) if q.question == "GTM"));
    }
}
