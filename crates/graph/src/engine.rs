use crate::gml::read_graph_file;
use crate::types::DocGraph;
use petgraph::graph::NodeIndex;
use std::path::Path;

/// First line of every context block
pub const CONTEXT_HEADER: &str = "=== Graph RAG Context ===";

/// Returned by queries when no graph could be loaded
pub const NOT_LOADED_MESSAGE: &str = "Error: Graph not loaded. Please build the graph first.";

/// Returned by queries that match no node
pub const NO_MATCH_MESSAGE: &str = "No related entities found in the graph.";

pub const DEFAULT_MAX_MATCHES: usize = 10;
pub const DEFAULT_EXCERPT_CHARS: usize = 200;

/// Query tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Matched nodes kept, in graph order
    pub max_matches: usize,

    /// Characters of passage text shown per matched node
    pub excerpt_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

/// Keyword retrieval over a loaded document graph
///
/// A failed load is not fatal: the engine stays usable and answers every query with
/// [`NOT_LOADED_MESSAGE`].
#[derive(Debug, Clone)]
pub struct GraphEngine {
    graph: Option<DocGraph>,
    load_error: Option<String>,
    config: QueryConfig,
}

impl GraphEngine {
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::load_with_config(path, QueryConfig::default())
    }

    pub fn load_with_config(path: impl AsRef<Path>, config: QueryConfig) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Graph file not found: {}", path.display());
            return Self {
                graph: None,
                load_error: Some(format!("graph file not found: {}", path.display())),
                config,
            };
        }

        match read_graph_file(path) {
            Ok(graph) => {
                log::info!(
                    "Loaded graph: {} ({} nodes, {} edges)",
                    path.display(),
                    graph.node_count(),
                    graph.edge_count()
                );
                Self {
                    graph: Some(graph),
                    load_error: None,
                    config,
                }
            }
            Err(err) => {
                log::warn!("Failed to load graph {}: {err}", path.display());
                Self {
                    graph: None,
                    load_error: Some(err.to_string()),
                    config,
                }
            }
        }
    }

    /// Engine over an in-memory graph
    pub fn from_graph(graph: DocGraph) -> Self {
        Self {
            graph: Some(graph),
            load_error: None,
            config: QueryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.is_some()
    }

    pub fn graph(&self) -> Option<&DocGraph> {
        self.graph.as_ref()
    }

    /// Why the last load left the engine without a graph
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Answer a keyword query with a one-hop context block
    pub fn query(&self, question: &str) -> String {
        let Some(graph) = &self.graph else {
            if let Some(err) = &self.load_error {
                log::warn!("Query against unloaded graph: {err}");
            }
            return NOT_LOADED_MESSAGE.to_string();
        };

        let nodes = find_nodes(graph, question, self.config.max_matches);
        if nodes.is_empty() {
            return NO_MATCH_MESSAGE.to_string();
        }

        render_context(graph, &nodes, self.config.excerpt_chars)
    }

    /// Nodes whose id or passage text contains `question`, ignoring case
    pub fn find_nodes(&self, question: &str) -> Vec<NodeIndex> {
        self.graph
            .as_ref()
            .map(|graph| find_nodes(graph, question, self.config.max_matches))
            .unwrap_or_default()
    }
}

fn find_nodes(graph: &DocGraph, question: &str, limit: usize) -> Vec<NodeIndex> {
    let needle = question.to_uppercase();

    graph
        .nodes()
        .filter(|(_, node)| {
            node.id.to_uppercase().contains(&needle)
                || node
                    .text
                    .as_deref()
                    .is_some_and(|text| text.to_uppercase().contains(&needle))
        })
        .map(|(idx, _)| idx)
        .take(limit)
        .collect()
}

fn render_context(graph: &DocGraph, nodes: &[NodeIndex], excerpt_chars: usize) -> String {
    let mut lines = vec![CONTEXT_HEADER.to_string()];

    for &idx in nodes {
        let Some(node) = graph.get_node(idx) else {
            continue;
        };

        lines.push(format!("\n[Entity: {}]", node.id));
        if let Some(text) = &node.text {
            let excerpt: String = text.chars().take(excerpt_chars).collect();
            lines.push(format!("Content: {excerpt}..."));
        }

        for (edge, target) in graph.outgoing(idx) {
            if let Some(neighbor) = graph.get_node(target) {
                lines.push(format!(
                    "  --[{}]--> {}",
                    edge.relationship.as_str(),
                    neighbor.id
                ));
            }
        }
    }

    lines.join("\n")
}
