//! GML persistence for document graphs.
//!
//! Layout written by [`write_gml`]:
//!
//! ```text
//! graph [
//!   directed 1
//!   node [
//!     id 1
//!     label "SEC:GTM Module"
//!     type "Section"
//!     name "GTM Module"
//!   ]
//!   edge [
//!     source 0
//!     target 1
//!     relation "CONTAINS"
//!   ]
//! ]
//! ```
//!
//! `label` carries the node identifier, `name` the display label and `text` the passage.
//! Strings are ASCII-only: `&`, `"`, control and non-ASCII characters are written as
//! character references (`&amp;`, `&quot;`, `&#NNN;`).

use crate::error::{GraphError, Result};
use crate::types::{DocGraph, GraphNode, NodeKind, RelationshipType};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::iter::Peekable;
use std::path::Path;
use std::vec::IntoIter;

/// Relation assumed for edges written without one
const DEFAULT_RELATION: &str = "related";

/// Serialize graph as GML (nodes, then edges, both in insertion order)
pub fn write_gml<W: Write>(graph: &DocGraph, mut out: W) -> io::Result<()> {
    writeln!(out, "graph [")?;
    writeln!(out, "  directed 1")?;

    for (idx, node) in graph.nodes() {
        writeln!(out, "  node [")?;
        writeln!(out, "    id {}", idx.index())?;
        writeln!(out, "    label {}", quote(&node.id))?;
        writeln!(out, "    type {}", quote(node.kind.as_str()))?;
        if let Some(label) = &node.label {
            writeln!(out, "    name {}", quote(label))?;
        }
        if let Some(text) = &node.text {
            writeln!(out, "    text {}", quote(text))?;
        }
        writeln!(out, "  ]")?;
    }

    for (source, target, edge) in graph.edges() {
        writeln!(out, "  edge [")?;
        writeln!(out, "    source {}", source.index())?;
        writeln!(out, "    target {}", target.index())?;
        writeln!(out, "    relation {}", quote(edge.relationship.as_str()))?;
        writeln!(out, "  ]")?;
    }

    writeln!(out, "]")
}

/// Write the graph to `path`, replacing any existing file.
///
/// The graph goes to a temporary sibling first and is renamed into place, so an
/// interrupted write never leaves a partial graph at `path`.
pub fn write_graph_file(graph: &DocGraph, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write_gml(graph, &mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| GraphError::Io(err.error))?;
    Ok(())
}

/// Read a graph previously written by [`write_graph_file`]
pub fn read_graph_file(path: &Path) -> Result<DocGraph> {
    let raw = fs::read_to_string(path)?;
    parse_gml(&raw)
}

impl DocGraph {
    /// Render as GML text
    #[must_use]
    pub fn to_gml(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = write_gml(self, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Parse GML text
    pub fn from_gml(src: &str) -> Result<Self> {
        parse_gml(src)
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => out.push_str(&format!("&#{};", u32::from(c))),
        }
    }
    out.push('"');
    out
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest
            .find(';')
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "quot" => Some('"'),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Key(String),
    Int(i64),
    Str(String),
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Key(key) => format!("key `{key}`"),
            Self::Int(v) => format!("integer {v}"),
            Self::Str(_) => "string".to_string(),
            Self::Open => "`[`".to_string(),
            Self::Close => "`]`".to_string(),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(&ch) = chars.peek() {
        match ch {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            '[' => {
                chars.next();
                tokens.push((Token::Open, line));
            }
            ']' => {
                chars.next();
                tokens.push((Token::Close, line));
            }
            '"' => {
                chars.next();
                let start = line;
                let mut raw = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            raw.push(c);
                        }
                        None => return Err(GraphError::format(start, "unterminated string")),
                    }
                }
                tokens.push((Token::Str(unescape(&raw)), start));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut key = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    key.push(c);
                    chars.next();
                }
                tokens.push((Token::Key(key), line));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.')) {
                        break;
                    }
                    num.push(c);
                    chars.next();
                }
                let value = num
                    .parse::<i64>()
                    .map_err(|_| GraphError::format(line, format!("invalid integer `{num}`")))?;
                tokens.push((Token::Int(value), line));
            }
            other => {
                return Err(GraphError::format(
                    line,
                    format!("unexpected character `{other}`"),
                ))
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug)]
enum GmlValue {
    Int(i64),
    Str(String),
    List(Vec<GmlEntry>),
}

#[derive(Debug)]
struct GmlEntry {
    key: String,
    value: GmlValue,
    line: usize,
}

type Tokens = Peekable<IntoIter<(Token, usize)>>;

fn parse_list(tokens: &mut Tokens, open_line: Option<usize>) -> Result<Vec<GmlEntry>> {
    let mut entries = Vec::new();

    loop {
        let Some((token, line)) = tokens.next() else {
            return match open_line {
                Some(open) => Err(GraphError::format(open, "list is never closed")),
                None => Ok(entries),
            };
        };

        let key = match token {
            Token::Key(key) => key,
            Token::Close if open_line.is_some() => return Ok(entries),
            other => {
                return Err(GraphError::format(
                    line,
                    format!("expected key, found {}", other.describe()),
                ))
            }
        };

        let (value_token, value_line) = tokens
            .next()
            .ok_or_else(|| GraphError::format(line, format!("missing value for `{key}`")))?;
        let value = match value_token {
            Token::Int(v) => GmlValue::Int(v),
            Token::Str(s) => GmlValue::Str(s),
            Token::Open => GmlValue::List(parse_list(tokens, Some(value_line))?),
            other => {
                return Err(GraphError::format(
                    value_line,
                    format!("expected value for `{key}`, found {}", other.describe()),
                ))
            }
        };

        entries.push(GmlEntry { key, value, line });
    }
}

impl GmlEntry {
    fn list(&self) -> Result<&[GmlEntry]> {
        match &self.value {
            GmlValue::List(entries) => Ok(entries),
            _ => Err(GraphError::format(
                self.line,
                format!("`{}` must be a list", self.key),
            )),
        }
    }
}

fn field<'a>(entries: &'a [GmlEntry], key: &str) -> Option<&'a GmlValue> {
    entries.iter().find(|e| e.key == key).map(|e| &e.value)
}

fn int_field(entries: &[GmlEntry], key: &str) -> Option<i64> {
    match field(entries, key)? {
        GmlValue::Int(v) => Some(*v),
        _ => None,
    }
}

fn str_field(entries: &[GmlEntry], key: &str) -> Option<String> {
    match field(entries, key)? {
        GmlValue::Str(s) => Some(s.clone()),
        GmlValue::Int(v) => Some(v.to_string()),
        GmlValue::List(_) => None,
    }
}

fn node_from_entry(entry: &GmlEntry) -> Result<(i64, GraphNode)> {
    let fields = entry.list()?;
    let gml_id = int_field(fields, "id")
        .ok_or_else(|| GraphError::format(entry.line, "node without integer `id`"))?;
    let id = str_field(fields, "label")
        .ok_or_else(|| GraphError::format(entry.line, format!("node {gml_id} has no `label`")))?;
    let kind_name = str_field(fields, "type")
        .ok_or_else(|| GraphError::format(entry.line, format!("node `{id}` has no `type`")))?;
    let kind = NodeKind::parse(&kind_name).ok_or_else(|| {
        GraphError::format(entry.line, format!("node `{id}` has unknown type `{kind_name}`"))
    })?;

    Ok((
        gml_id,
        GraphNode {
            id,
            kind,
            label: str_field(fields, "name"),
            text: str_field(fields, "text"),
        },
    ))
}

fn resolve(ids: &HashMap<i64, NodeIndex>, fields: &[GmlEntry], key: &str, line: usize) -> Result<NodeIndex> {
    let gml_id = int_field(fields, key)
        .ok_or_else(|| GraphError::format(line, format!("edge without integer `{key}`")))?;
    ids.get(&gml_id)
        .copied()
        .ok_or_else(|| GraphError::format(line, format!("edge {key} {gml_id} is not a node")))
}

/// Parse GML text into a document graph
pub fn parse_gml(src: &str) -> Result<DocGraph> {
    let mut tokens = tokenize(src)?.into_iter().peekable();
    let top = parse_list(&mut tokens, None)?;
    let graph_entry = top
        .iter()
        .find(|e| e.key == "graph")
        .ok_or_else(|| GraphError::format(1, "missing `graph` block"))?;

    let mut graph = DocGraph::new();
    let mut ids: HashMap<i64, NodeIndex> = HashMap::new();
    let mut edges = Vec::new();

    for entry in graph_entry.list()? {
        match entry.key.as_str() {
            "directed" => {
                if !matches!(entry.value, GmlValue::Int(1)) {
                    return Err(GraphError::format(
                        entry.line,
                        "only directed graphs are supported",
                    ));
                }
            }
            "node" => {
                let (gml_id, node) = node_from_entry(entry)?;
                if ids.contains_key(&gml_id) {
                    return Err(GraphError::format(
                        entry.line,
                        format!("duplicate node id {gml_id}"),
                    ));
                }
                if graph.find_node(&node.id).is_some() {
                    return Err(GraphError::format(
                        entry.line,
                        format!("duplicate node label `{}`", node.id),
                    ));
                }
                ids.insert(gml_id, graph.add_node(node));
            }
            "edge" => edges.push(entry),
            _ => {}
        }
    }

    for entry in edges {
        let fields = entry.list()?;
        let source = resolve(&ids, fields, "source", entry.line)?;
        let target = resolve(&ids, fields, "target", entry.line)?;
        let relation = str_field(fields, "relation").unwrap_or_else(|| DEFAULT_RELATION.to_string());
        graph.add_edge(source, target, RelationshipType::from_label(&relation));
    }

    Ok(graph)
}
