//! Build, persist and query document graphs end to end

use datasheet_graph::{
    DocGraph, GraphBuilder, GraphEngine, GraphSession, GraphSettings, NodeKind, RelationshipType,
    Segment, CONTEXT_HEADER, NOT_LOADED_MESSAGE, NO_MATCH_MESSAGE,
};
use pretty_assertions::assert_eq;
use std::fs;

const GTM_TEXT: &str =
    "The Generic Timer Module (GTM) ensures precise timing. It triggers the ADC.";
const ADC_TEXT: &str = "The Analog-Digital Converter (ADC) receives triggers from GTM.";

fn datasheet_segments() -> Vec<Segment> {
    vec![
        Segment::section_header("GTM Module"),
        Segment::text(GTM_TEXT),
        Segment::section_header("ADC Module"),
        Segment::text(ADC_TEXT),
    ]
}

fn relation(graph: &DocGraph, from: &str, to: &str) -> Option<RelationshipType> {
    let from = graph.find_node(from)?;
    let to = graph.find_node(to)?;
    graph
        .outgoing(from)
        .into_iter()
        .find(|(_, target)| *target == to)
        .map(|(edge, _)| edge.relationship.clone())
}

#[test]
fn single_section_with_passage() {
    let graph = GraphBuilder::default().build_graph(&[
        Segment::section_header("A"),
        Segment::text(GTM_TEXT),
    ]);

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(relation(&graph, "ROOT", "SEC:A"), Some(RelationshipType::Contains));
    assert_eq!(
        relation(&graph, "SEC:A", "TXT:The Generic Timer Mo"),
        Some(RelationshipType::Has)
    );

    let section = graph.find_node("SEC:A").unwrap();
    let node = graph.get_node(section).unwrap();
    assert_eq!(node.kind, NodeKind::Section);
    assert_eq!(node.label.as_deref(), Some("A"));
}

#[test]
fn every_node_but_root_has_a_parent() {
    let graph = GraphBuilder::default().build_graph(&datasheet_segments());
    for (idx, node) in graph.nodes() {
        if node.kind == NodeKind::Root {
            assert_eq!(graph.in_degree(idx), 0);
        } else {
            assert!(graph.in_degree(idx) >= 1, "{} has no parent", node.id);
        }
    }
}

#[test]
fn duplicate_headings_collapse() {
    // Same parent twice: one node, one edge.
    let graph = GraphBuilder::default().build_graph(&[
        Segment::section_header("Registers"),
        Segment::section_header(" Registers "),
    ]);
    assert_eq!(graph.count_kind(NodeKind::Section), 1);
    let contains: Vec<_> = graph
        .edges()
        .filter(|(_, _, e)| e.relationship == RelationshipType::Contains)
        .collect();
    // ROOT -> Registers, then Registers -> Registers (current parent is itself).
    assert_eq!(contains.len(), 2);

    // Different parent: a second CONTAINS edge into the same node.
    let graph = GraphBuilder::default().build_graph(&[
        Segment::section_header("Registers"),
        Segment::section_header("GTM"),
        Segment::section_header("Registers"),
    ]);
    assert_eq!(graph.count_kind(NodeKind::Section), 2);
    let registers = graph.find_node("SEC:Registers").unwrap();
    assert_eq!(graph.in_degree(registers), 2);
    assert_eq!(relation(&graph, "SEC:GTM", "SEC:Registers"), Some(RelationshipType::Contains));
}

#[test]
fn short_passages_never_become_nodes() {
    let graph = GraphBuilder::default().build_graph(&[
        Segment::section_header("A"),
        Segment::text("Too short to matter."),
        Segment::text(&"z".repeat(50)),
    ]);
    assert_eq!(graph.count_kind(NodeKind::Content), 0);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn datasheet_scenario_query() {
    let engine = GraphEngine::from_graph(GraphBuilder::default().build_graph(&datasheet_segments()));
    let context = engine.query("GTM");

    assert!(context.starts_with(CONTEXT_HEADER));
    assert!(context.contains("[Entity: SEC:GTM Module]"));
    assert!(context.contains("Generic Timer Module (GTM) ensures precise timing"));
    assert!(context.contains("  --[HAS]--> TXT:The Generic Timer Mo"));
    // The ADC passage mentions GTM in its text.
    assert!(context.contains("[Entity: TXT:The Analog-Digital "));
}

#[test]
fn text_match_returns_truncated_excerpt() {
    let long_passage = format!("Watchdog timeout handling. {}", "Lorem ipsum dolor sit. ".repeat(20));
    let engine = GraphEngine::from_graph(GraphBuilder::default().build_graph(&[
        Segment::section_header("SCU"),
        Segment::text(&long_passage),
    ]));

    let context = engine.query("watchdog TIMEOUT");
    let content_line = context
        .lines()
        .find(|line| line.starts_with("Content: "))
        .expect("content line");
    let excerpt = content_line
        .trim_start_matches("Content: ")
        .trim_end_matches("...");
    assert_eq!(excerpt.chars().count(), 200);
    assert!(long_passage.starts_with(excerpt));
    assert!(context.contains("[Entity: TXT:Watchdog timeout han]"));
}

#[test]
fn more_than_ten_matches_are_capped() {
    let segments: Vec<Segment> = (0..14)
        .map(|i| Segment::section_header(format!("Channel {i}")))
        .collect();
    let engine = GraphEngine::from_graph(GraphBuilder::default().build_graph(&segments));
    let context = engine.query("channel");

    let entities: Vec<&str> = context
        .lines()
        .filter(|line| line.starts_with("[Entity: "))
        .collect();
    let expected: Vec<String> = (0..10)
        .map(|i| format!("[Entity: SEC:Channel {i}]"))
        .collect();
    assert_eq!(entities, expected);
}

#[test]
fn unloaded_engine_and_unmatched_queries_do_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    let engine = GraphEngine::load(dir.path().join("absent.gml"));
    assert_eq!(engine.query("GTM"), NOT_LOADED_MESSAGE);

    let engine = GraphEngine::from_graph(GraphBuilder::default().build_graph(&datasheet_segments()));
    assert_eq!(engine.query("CAN bus"), NO_MATCH_MESSAGE);
}

#[test]
fn persisted_graph_answers_like_in_memory_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("datasheet_graph.gml");
    let builder = GraphBuilder::default();

    let in_memory = GraphEngine::from_graph(builder.build_graph(&datasheet_segments()));
    builder.build(&datasheet_segments(), &path).unwrap();
    let reloaded = GraphEngine::load(&path);

    assert!(reloaded.is_loaded());
    for question in ["GTM Module", "adc", "ROOT", "triggers", "missing"] {
        assert_eq!(reloaded.query(question), in_memory.query(question), "{question}");
    }
}

#[test]
fn rebuild_replaces_graph_and_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.gml");
    let builder = GraphBuilder::default();

    builder.build(&datasheet_segments(), &path).unwrap();
    let first = fs::read(&path).unwrap();
    builder.build(&datasheet_segments(), &path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), first);

    builder.build(&[], &path).unwrap();
    let reloaded = GraphEngine::load(&path);
    assert_eq!(reloaded.graph().unwrap().node_count(), 1);
}

#[test]
fn session_builds_from_markdown_and_queries() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("tc38x.md");
    fs::write(
        &doc,
        format!("## GTM Module\n\n{GTM_TEXT}\n\n## ADC Module\n\n{ADC_TEXT}\n"),
    )
    .unwrap();

    let session =
        GraphSession::new(GraphSettings::default().with_graph_path(dir.path().join("g.gml")));
    let report = session.build_report(&doc);
    assert_eq!(
        report,
        format!(
            "Graph built successfully! Saved to {}",
            dir.path().join("g.gml").display()
        )
    );

    let context = session.context_for("adc module");
    assert!(context.contains("[Entity: SEC:ADC Module]"));
    assert!(context.contains("  --[HAS]--> TXT:The Analog-Digital "));
}

#[test]
fn session_builds_from_docling_export() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("tc38x.json");
    let export = serde_json::json!({
        "schema_name": "DoclingDocument",
        "texts": [
            {"label": "title", "text": "AURIX TC38x"},
            {"label": "section_header", "text": "GTM Module"},
            {"label": "text", "text": GTM_TEXT},
            {"label": "caption", "text": "Figure 1 GTM block diagram"}
        ]
    });
    fs::write(&doc, export.to_string()).unwrap();

    let session =
        GraphSession::new(GraphSettings::default().with_graph_path(dir.path().join("g.gml")));
    let handle = session.build(&doc).unwrap();
    assert_eq!(handle.node_count, 3);
    assert!(!session.context_for("Figure 1").contains("[Entity:"));
}

#[test]
fn session_reports_unparsable_document() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("broken.json");
    fs::write(&doc, "{ not json").unwrap();

    let session =
        GraphSession::new(GraphSettings::default().with_graph_path(dir.path().join("g.gml")));
    let report = session.build_report(&doc);
    assert!(report.starts_with("Build failed: Failed to read document"), "{report}");
    assert!(!dir.path().join("g.gml").exists());
}
