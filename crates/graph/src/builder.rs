use crate::error::Result;
use crate::gml::write_graph_file;
use crate::segment::{Segment, SegmentKind};
use crate::source::DocumentSource;
use crate::types::{DocGraph, GraphNode, RelationshipType, ROOT_ID};
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Passages at or below this many characters never become content nodes
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 50;

/// Number of leading passage characters kept in a content node id
pub const DEFAULT_CONTENT_ID_CHARS: usize = 20;

/// Hierarchy pass tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    pub min_content_chars: usize,
    pub content_id_chars: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
            content_id_chars: DEFAULT_CONTENT_ID_CHARS,
        }
    }
}

/// Relation proposed by an extractor, addressed by node ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRelation {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// External relation extraction (e.g. a language model) run after the hierarchy pass
pub trait RelationExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, segments: &[Segment], graph: &DocGraph) -> Result<Vec<ExtractedRelation>>;
}

/// Optional augmentation step of a build
#[derive(Clone, Default)]
pub enum SemanticPass {
    /// Structure-only mode
    #[default]
    Disabled,

    /// Best-effort augmentation with the given extractor
    Enabled(Arc<dyn RelationExtractor>),
}

impl fmt::Debug for SemanticPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Enabled(extractor) => write!(f, "Enabled({})", extractor.name()),
        }
    }
}

/// Result of a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphHandle {
    pub output_path: PathBuf,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Build document hierarchy graph from segments
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: BuildConfig,
    semantic: SemanticPass,
}

impl GraphBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            semantic: SemanticPass::Disabled,
        }
    }

    #[must_use]
    pub fn with_semantic_pass(mut self, semantic: SemanticPass) -> Self {
        self.semantic = semantic;
        self
    }

    pub fn config(&self) -> BuildConfig {
        self.config
    }

    /// Build the in-memory graph without persisting it
    pub fn build_graph(&self, segments: &[Segment]) -> DocGraph {
        let mut graph = DocGraph::new();
        self.add_hierarchy(&mut graph, segments);

        match &self.semantic {
            SemanticPass::Enabled(extractor) => {
                log::info!("Extracting semantic relations with {}", extractor.name());
                Self::add_semantics(&mut graph, segments, extractor.as_ref());
            }
            SemanticPass::Disabled => {
                log::debug!("Skipping semantic extraction (no extractor configured)");
            }
        }

        log::info!(
            "Built document graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Build the graph and persist it at `output`, replacing any previous graph there
    pub fn build(&self, segments: &[Segment], output: &Path) -> Result<GraphHandle> {
        let graph = self.build_graph(segments);
        write_graph_file(&graph, output)?;
        log::info!("Graph saved to {}", output.display());

        Ok(GraphHandle {
            output_path: output.to_path_buf(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        })
    }

    /// Parse `input` with `source`, then build and persist
    pub fn build_from_document(
        &self,
        source: &dyn DocumentSource,
        input: &Path,
        output: &Path,
    ) -> Result<GraphHandle> {
        log::info!("Reading {} ({})", input.display(), source.name());
        let segments = source.segments(input)?;
        self.build(&segments, output)
    }

    /// Single current-parent pointer: each heading becomes the child of the most
    /// recently seen heading (ROOT before the first one).
    fn add_hierarchy(&self, graph: &mut DocGraph, segments: &[Segment]) {
        let root = graph.add_node(GraphNode::root());
        let mut parent: NodeIndex = root;

        for segment in segments {
            match segment.kind {
                SegmentKind::SectionHeader => {
                    let heading = segment.text.trim();
                    if heading.is_empty() {
                        continue;
                    }
                    let node = graph.add_node(GraphNode::section(heading));
                    graph.add_edge(parent, node, RelationshipType::Contains);
                    parent = node;
                }
                SegmentKind::Text => {
                    let passage = segment.text.trim();
                    if passage.chars().count() <= self.config.min_content_chars {
                        continue;
                    }
                    let node =
                        graph.add_node(GraphNode::content(passage, self.config.content_id_chars));
                    graph.add_edge(parent, node, RelationshipType::Has);
                }
                SegmentKind::Other(_) => {}
            }
        }
    }

    /// Extractor failures and unknown node ids are logged and skipped; existing
    /// hierarchy edges are never overwritten and ROOT never gains an incoming edge.
    fn add_semantics(graph: &mut DocGraph, segments: &[Segment], extractor: &dyn RelationExtractor) {
        let relations = match extractor.extract(segments, graph) {
            Ok(relations) => relations,
            Err(err) => {
                log::warn!("Semantic extraction failed, keeping structure only: {err}");
                return;
            }
        };

        let root = graph.find_node(ROOT_ID);
        let mut added = 0usize;
        for rel in relations {
            let (Some(from), Some(to)) = (graph.find_node(&rel.source), graph.find_node(&rel.target))
            else {
                log::debug!("Dropping relation {} -> {}: unknown node", rel.source, rel.target);
                continue;
            };
            if Some(to) == root {
                log::debug!("Dropping relation {} -> {}: ROOT cannot be a target", rel.source, rel.target);
                continue;
            }
            if rel.relation.trim().is_empty() || graph.contains_edge(from, to) {
                continue;
            }
            graph.add_edge(from, to, RelationshipType::from_label(rel.relation.trim()));
            added += 1;
        }
        log::info!("Added {added} semantic relations");
    }
}
