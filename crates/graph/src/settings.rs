use crate::builder::BuildConfig;
use crate::engine::QueryConfig;
use std::env;
use std::path::PathBuf;

/// Graph file used when nothing else is configured
pub const DEFAULT_GRAPH_FILE: &str = "datasheet_graph.gml";

pub const ENV_GRAPH_PATH: &str = "DATASHEET_GRAPH_PATH";
pub const ENV_MIN_CONTENT_CHARS: &str = "DATASHEET_GRAPH_MIN_CONTENT_CHARS";
pub const ENV_CONTENT_ID_CHARS: &str = "DATASHEET_GRAPH_CONTENT_ID_CHARS";
pub const ENV_MAX_MATCHES: &str = "DATASHEET_GRAPH_MAX_MATCHES";
pub const ENV_EXCERPT_CHARS: &str = "DATASHEET_GRAPH_EXCERPT_CHARS";

/// Runtime settings shared by the CLI and the MCP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSettings {
    /// Where builds are written and queries load from
    pub graph_path: PathBuf,
    pub build: BuildConfig,
    pub query: QueryConfig,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            graph_path: PathBuf::from(DEFAULT_GRAPH_FILE),
            build: BuildConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl GraphSettings {
    /// Defaults overridden by `DATASHEET_GRAPH_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`GraphSettings::from_env`] with an injectable variable lookup.
    /// Invalid values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(path) = lookup(ENV_GRAPH_PATH) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                settings.graph_path = PathBuf::from(trimmed);
            }
        }

        let count = |key: &str, min: usize, default: usize| -> usize {
            let Some(raw) = lookup(key) else {
                return default;
            };
            match raw.trim().parse::<usize>() {
                Ok(value) if value >= min => value,
                _ => {
                    log::warn!("Ignoring {key}={raw:?}: expected an integer >= {min}");
                    default
                }
            }
        };

        settings.build.min_content_chars =
            count(ENV_MIN_CONTENT_CHARS, 0, settings.build.min_content_chars);
        settings.build.content_id_chars =
            count(ENV_CONTENT_ID_CHARS, 1, settings.build.content_id_chars);
        settings.query.max_matches = count(ENV_MAX_MATCHES, 1, settings.query.max_matches);
        settings.query.excerpt_chars = count(ENV_EXCERPT_CHARS, 1, settings.query.excerpt_chars);

        settings
    }

    #[must_use]
    pub fn with_graph_path(mut self, graph_path: impl Into<PathBuf>) -> Self {
        self.graph_path = graph_path.into();
        self
    }
}
