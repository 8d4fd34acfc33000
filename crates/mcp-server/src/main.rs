//! Datasheet Graph MCP Server
//!
//! Exposes datasheet hierarchy graphs to AI agents via MCP protocol.
//!
//! ## Tools
//!
//! - `build_datasheet_graph` - Build the graph from a docling JSON / Markdown export
//! - `get_datasheet_context` - Matching sections and passages with one-hop relations
//!
//! ## Configuration
//!
//! - `DATASHEET_GRAPH_PATH` - graph file (default `datasheet_graph.gml`)
//! - `DATASHEET_GRAPH_MIN_CONTENT_CHARS`, `DATASHEET_GRAPH_CONTENT_ID_CHARS`,
//!   `DATASHEET_GRAPH_MAX_MATCHES`, `DATASHEET_GRAPH_EXCERPT_CHARS` - tuning
//! - `RUST_LOG` - log filter (logs go to stderr)
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "datasheet-graph": {
//!       "command": "datasheet-graph-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use datasheet_graph::GraphSettings;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use std::env;

mod tools;

use tools::DatasheetGraphService;

fn print_help() {
    println!("Datasheet Graph MCP server");
    println!();
    println!("Usage: datasheet-graph-mcp [--version|--help]");
    println!();
    println!("Flags:");
    println!("  --version      Print version and exit");
    println!("  --help         Print this help and exit");
}

fn handle_cli_args() -> Option<i32> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return None;
    }

    if args.len() == 1 {
        match args[0].as_str() {
            "--version" | "-V" => {
                println!("datasheet-graph-mcp {}", env!("CARGO_PKG_VERSION"));
                return Some(0);
            }
            "--help" | "-h" => {
                print_help();
                return Some(0);
            }
            _ => {}
        }
    }

    eprintln!("Unknown arguments: {}", args.join(" "));
    print_help();
    Some(2)
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Some(exit_code) = handle_cli_args() {
        std::process::exit(exit_code);
    }

    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let settings = GraphSettings::from_env();
    log::info!(
        "Starting Datasheet Graph MCP server (graph: {})",
        settings.graph_path.display()
    );

    let service = DatasheetGraphService::new(settings);
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("Datasheet Graph MCP server stopped");
    Ok(())
}
