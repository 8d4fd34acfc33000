use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of the single root node every graph carries
pub const ROOT_ID: &str = "ROOT";

/// Prefix of section node identifiers (`SEC:<heading>`)
pub const SECTION_PREFIX: &str = "SEC:";

/// Prefix of content node identifiers (`TXT:<leading chars>`)
pub const CONTENT_PREFIX: &str = "TXT:";

/// Kind of graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Document root, always present
    Root,

    /// Document heading
    Section,

    /// Body passage long enough to be meaningful
    Content,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Section => "Section",
            Self::Content => "Content",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Root" => Some(Self::Root),
            "Section" => Some(Self::Section),
            "Content" => Some(Self::Content),
            _ => None,
        }
    }
}

/// Type of relationship between nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Parent section contains child section
    Contains,

    /// Section (or root) owns a content passage
    Has,

    /// Relation added by an external extractor (label kept verbatim)
    Semantic(String),
}

impl RelationshipType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Contains => "CONTAINS",
            Self::Has => "HAS",
            Self::Semantic(label) => label.as_str(),
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "CONTAINS" => Self::Contains,
            "HAS" => Self::Has,
            other => Self::Semantic(other.to_string()),
        }
    }

    /// Whether the relation belongs to the document hierarchy
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Contains | Self::Has)
    }
}

/// Node in document graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier (`ROOT`, `SEC:...`, `TXT:...`)
    pub id: String,

    /// Node kind
    pub kind: NodeKind,

    /// Display label (heading text for sections)
    pub label: Option<String>,

    /// Full passage text (content nodes)
    pub text: Option<String>,
}

impl GraphNode {
    #[must_use]
    pub fn root() -> Self {
        Self {
            id: ROOT_ID.to_string(),
            kind: NodeKind::Root,
            label: None,
            text: None,
        }
    }

    /// Section node for an already trimmed heading
    #[must_use]
    pub fn section(heading: &str) -> Self {
        Self {
            id: format!("{SECTION_PREFIX}{heading}"),
            kind: NodeKind::Section,
            label: Some(heading.to_string()),
            text: None,
        }
    }

    /// Content node for an already trimmed passage; the identifier keeps the first
    /// `id_chars` characters of the passage.
    #[must_use]
    pub fn content(passage: &str, id_chars: usize) -> Self {
        let prefix: String = passage.chars().take(id_chars).collect();
        Self {
            id: format!("{CONTENT_PREFIX}{prefix}"),
            kind: NodeKind::Content,
            label: None,
            text: Some(passage.to_string()),
        }
    }
}

/// Edge in document graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Type of relationship
    pub relationship: RelationshipType,
}

impl From<RelationshipType> for GraphEdge {
    fn from(relationship: RelationshipType) -> Self {
        Self { relationship }
    }
}

/// Directed document graph
///
/// Node and edge indices follow insertion order, which is also the order used for
/// matching, context assembly and persistence.
#[derive(Debug, Clone)]
pub struct DocGraph {
    /// Directed graph (parent -> child with relationships)
    pub graph: DiGraph<GraphNode, GraphEdge>,

    /// Node id -> NodeIndex mapping for fast lookup
    pub id_index: HashMap<String, NodeIndex>,
}

impl DocGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Add node unless a node with the same id exists; returns the node's index either way
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        idx
    }

    /// Add edge between nodes. An existing edge for the same (from, to) pair is updated
    /// in place, so at most one edge joins any ordered pair.
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        relationship: RelationshipType,
    ) -> EdgeIndex {
        self.graph.update_edge(from, to, GraphEdge::from(relationship))
    }

    pub fn contains_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.contains_edge(from, to)
    }

    /// Find node by id
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    /// Get node data
    pub fn get_node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    /// Get all edges in insertion order as (source, target, edge)
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &GraphEdge)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    /// Outgoing edges of a node in insertion order
    #[must_use]
    pub fn outgoing(&self, node: NodeIndex) -> Vec<(&GraphEdge, NodeIndex)> {
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| (e.weight(), e.target())).collect()
    }

    /// Number of incoming edges of a node
    #[must_use]
    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.graph
            .edges_directed(node, petgraph::Direction::Incoming)
            .count()
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Count nodes of the given kind
    #[must_use]
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes().filter(|(_, node)| node.kind == kind).count()
    }
}

impl Default for DocGraph {
    fn default() -> Self {
        Self::new()
    }
}
