//! Tool-call boundary: build and query entry points that always answer with a string.

use crate::builder::{GraphBuilder, GraphHandle, SemanticPass};
use crate::engine::GraphEngine;
use crate::error::{GraphError, Result};
use crate::settings::GraphSettings;
use crate::source::source_for_path;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Returned when a query arrives before any graph file exists
pub const GRAPH_NOT_FOUND_MESSAGE: &str = "Graph not found. Run 'build_datasheet_graph' first.";

/// Owns the builder and the lazily loaded engine for one graph path
///
/// The engine is loaded on the first query and reused afterwards; a successful build
/// drops it so the next query reads the fresh graph.
#[derive(Debug)]
pub struct GraphSession {
    settings: GraphSettings,
    builder: GraphBuilder,
    engine: Mutex<Option<Arc<GraphEngine>>>,
}

impl GraphSession {
    pub fn new(settings: GraphSettings) -> Self {
        let builder = GraphBuilder::new(settings.build);
        Self {
            settings,
            builder,
            engine: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_semantic_pass(mut self, semantic: SemanticPass) -> Self {
        self.builder = self.builder.with_semantic_pass(semantic);
        self
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn graph_path(&self) -> &Path {
        &self.settings.graph_path
    }

    /// Build the graph for `source_path` into the configured graph path
    pub fn build(&self, source_path: &Path) -> Result<GraphHandle> {
        if !source_path.exists() {
            return Err(GraphError::DocumentNotFound(source_path.to_path_buf()));
        }

        let source = source_for_path(source_path)?;
        let handle =
            self.builder
                .build_from_document(source.as_ref(), source_path, &self.settings.graph_path)?;
        self.reset();
        Ok(handle)
    }

    /// [`GraphSession::build`] rendered as a user-facing message
    pub fn build_report(&self, source_path: &Path) -> String {
        match self.build(source_path) {
            Ok(handle) => format!(
                "Graph built successfully! Saved to {}",
                handle.output_path.display()
            ),
            Err(err @ GraphError::DocumentNotFound(_)) => format!("Error: {err}"),
            Err(err) => {
                log::warn!("Build failed for {}: {err}", source_path.display());
                format!("Build failed: {err}")
            }
        }
    }

    /// Cached engine, loading it on first use. `None` when no graph file exists yet;
    /// nothing is cached in that case.
    pub fn engine(&self) -> Option<Arc<GraphEngine>> {
        let mut slot = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = slot.as_ref() {
            return Some(Arc::clone(engine));
        }
        if !self.settings.graph_path.exists() {
            return None;
        }

        let engine = Arc::new(GraphEngine::load_with_config(
            &self.settings.graph_path,
            self.settings.query,
        ));
        *slot = Some(Arc::clone(&engine));
        Some(engine)
    }

    /// Context block for `question`, or a guidance message when no graph exists
    pub fn context_for(&self, question: &str) -> String {
        match self.engine() {
            Some(engine) => engine.query(question),
            None => GRAPH_NOT_FOUND_MESSAGE.to_string(),
        }
    }

    /// Drop the cached engine
    pub fn reset(&self) {
        let mut slot = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}
