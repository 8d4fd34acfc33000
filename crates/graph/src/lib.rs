//! # Datasheet Graph
//!
//! Document structure graphs for retrieval-augmented answers over technical datasheets.
//!
//! ## Features
//!
//! - **Hierarchy graph** - section headings and long passages linked as a directed graph
//! - **GML persistence** - human-readable graph files, atomically replaced on rebuild
//! - **Keyword retrieval** - case-insensitive node matching with one-hop context
//! - **Tool-call session** - build/query entry points that always answer with a string
//!
//! ## Architecture
//!
//! ```text
//! Document (docling JSON / Markdown)
//!     │
//!     ├──> DocumentSource
//!     │      └─ Ordered segments (section_header, text, ...)
//!     │
//!     ├──> Graph Builder
//!     │      ├─ ROOT ──CONTAINS──> SEC:<heading> ──HAS──> TXT:<passage>
//!     │      ├─ Optional semantic pass (pluggable extractor)
//!     │      └─ Persist as GML
//!     │
//!     └──> Graph Engine
//!            ├─ Lazy load of the GML file
//!            ├─ Match node ids / passage text
//!            └─ Render one-hop context block
//! ```

mod builder;
mod engine;
mod error;
mod gml;
mod segment;
mod session;
mod settings;
mod source;
mod types;

pub use builder::{
    BuildConfig, ExtractedRelation, GraphBuilder, GraphHandle, RelationExtractor, SemanticPass,
    DEFAULT_CONTENT_ID_CHARS, DEFAULT_MIN_CONTENT_CHARS,
};
pub use engine::{
    GraphEngine, QueryConfig, CONTEXT_HEADER, DEFAULT_EXCERPT_CHARS, DEFAULT_MAX_MATCHES,
    NOT_LOADED_MESSAGE, NO_MATCH_MESSAGE,
};
pub use error::{GraphError, Result};
pub use gml::{parse_gml, read_graph_file, write_gml, write_graph_file};
pub use segment::{Segment, SegmentKind};
pub use session::{GraphSession, GRAPH_NOT_FOUND_MESSAGE};
pub use settings::{
    GraphSettings, DEFAULT_GRAPH_FILE, ENV_CONTENT_ID_CHARS, ENV_EXCERPT_CHARS, ENV_GRAPH_PATH,
    ENV_MAX_MATCHES, ENV_MIN_CONTENT_CHARS,
};
pub use source::{source_for_path, DoclingJsonSource, DocumentSource, MarkdownSource};
pub use types::{
    DocGraph, GraphEdge, GraphNode, NodeKind, RelationshipType, CONTENT_PREFIX, ROOT_ID,
    SECTION_PREFIX,
};
