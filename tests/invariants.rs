// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the flow graph model
//!
//! These tests verify critical invariants:
//! 1. Determinism - same operations produce same ids and results
//! 2. Connection rules - type compatibility is decided in one place
//! 3. Ordering - every edge points forward in the execution order
//! 4. Persistence - flows survive a save/load round trip unchanged

use flowdeck::graph::FlowGraph;
use flowdeck::store::Workspace;
use flowdeck::types::{
    CodeLanguage, Edge, Flow, Function, Mapping, Node, Port, PortType, Position, Transform,
};
use flowdeck::validate::{check_connection, validate_flow, Subject};
use flowdeck::error::FlowError;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn make_function(name: &str, inputs: &[(&str, PortType)], outputs: &[(&str, PortType)]) -> Function {
    Function {
        id: Function::generate_id(name),
        name: name.into(),
        description: None,
        inputs: inputs.iter().map(|(n, t)| Port::new(*n, *t)).collect(),
        outputs: outputs.iter().map(|(n, t)| Port::new(*n, *t)).collect(),
        code_language: CodeLanguage::Python,
        implementation: String::new(),
    }
}

fn passthrough(ty: PortType) -> Function {
    make_function("pass", &[("in", ty)], &[("out", ty)])
}

/// A chain of `n` passthrough nodes p-1 -> p-2 -> ... -> p-n
fn chain(n: usize) -> FlowGraph {
    let f = passthrough(PortType::String);
    let mut graph = FlowGraph::new("chain");
    for i in 1..=n {
        graph
            .add_node(Node::from_function(format!("p-{i}"), &f, Position::default()))
            .unwrap();
    }
    for i in 1..n {
        graph
            .connect(Edge::new(format!("p-{i}"), "out", format!("p-{}", i + 1), "in"))
            .unwrap();
    }
    graph
}

fn port_type() -> impl Strategy<Value = PortType> {
    prop::sample::select(PortType::ALL.to_vec())
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_edge_id_determinism() {
    let id1 = Edge::generate_id("a", "out", "b", "in");
    let id2 = Edge::generate_id("a", "out", "b", "in");

    assert_eq!(id1, id2);
    assert!(id1.starts_with("edge:"));
    assert_eq!(id1.len(), "edge:".len() + 8);
}

#[test]
fn test_edge_id_uniqueness() {
    let ids: HashSet<_> = [
        Edge::generate_id("a", "out", "b", "in"),
        Edge::generate_id("a", "out", "c", "in"),
        Edge::generate_id("a", "out2", "b", "in"),
        Edge::generate_id("a", "out", "b", "in2"),
        Edge::generate_id("b", "out", "a", "in"),
        // Field boundaries matter
        Edge::generate_id("ao", "ut", "b", "in"),
    ]
    .into_iter()
    .collect();
    assert_eq!(ids.len(), 6, "All edge IDs should be unique");
}

#[test]
fn test_entity_ids_are_slugged() {
    assert_eq!(Function::generate_id("Entity Extractor"), "fn:entity-extractor");
    assert_eq!(Flow::generate_id("Nightly Build!"), "flow:nightly-build");
}

#[test]
fn test_connect_idempotent() {
    let mut graph = chain(2);
    let edge = Edge::new("p-1", "out", "p-2", "in");
    graph.connect(edge.clone()).unwrap();
    graph.connect(edge).unwrap();
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_node_insertion_order_independence() {
    let f = passthrough(PortType::Any);
    let mut g1 = FlowGraph::new("x");
    let mut g2 = FlowGraph::new("x");
    for id in ["a", "b", "c"] {
        g1.add_node(Node::from_function(id, &f, Position::default())).unwrap();
    }
    for id in ["c", "a", "b"] {
        g2.add_node(Node::from_function(id, &f, Position::default())).unwrap();
    }
    for g in [&mut g1, &mut g2] {
        g.connect(Edge::new("a", "out", "b", "in")).unwrap();
        g.connect(Edge::new("b", "out", "c", "in")).unwrap();
    }

    let ids = |g: &FlowGraph| g.execution_order().unwrap().iter().map(|n| n.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&g1), vec!["a", "b", "c"]);
    assert_eq!(ids(&g2), vec!["a", "b", "c"]);
}

// =============================================================================
// Connection Rules
// =============================================================================

#[test]
fn test_any_connects_both_ways() {
    for ty in PortType::ALL {
        assert!(check_connection(PortType::Any, ty, None).is_ok());
        assert!(check_connection(ty, PortType::Any, None).is_ok());
    }
}

#[test]
fn test_mismatched_transform_rejected() {
    // The transform must declare exactly source -> target
    let t = Transform::cast(PortType::String, PortType::Number);
    assert!(check_connection(PortType::Array, PortType::Number, Some(&t)).is_err());
    assert!(check_connection(PortType::String, PortType::Boolean, Some(&t)).is_err());
    assert!(check_connection(PortType::String, PortType::Number, Some(&t)).is_ok());
}

#[test]
fn test_rejected_connect_leaves_graph_untouched() {
    let text = make_function("text", &[], &[("s", PortType::String)]);
    let count = make_function("count", &[("n", PortType::Number)], &[]);
    let mut graph = FlowGraph::new("x");
    graph.add_node(Node::from_function("t", &text, Position::default())).unwrap();
    graph.add_node(Node::from_function("c", &count, Position::default())).unwrap();

    let before = graph.flow().clone();
    assert!(matches!(
        graph.connect(Edge::new("t", "s", "c", "n")),
        Err(FlowError::TypeMismatch { .. })
    ));
    assert!(matches!(
        graph.connect(Edge::new("t", "nope", "c", "n")),
        Err(FlowError::UnknownPort { .. })
    ));
    assert!(matches!(
        graph.connect(Edge::new("t", "s", "t", "s")),
        Err(FlowError::InvalidConnection(_))
    ));
    assert_eq!(graph.flow(), &before);
}

#[test]
fn test_validate_collects_every_violation() {
    let f = passthrough(PortType::String);
    let mut flow = Flow::new("broken");
    flow.nodes.push(Node::from_function("a", &f, Position::default()));
    flow.nodes.push(Node::from_function("b", &f, Position::default()));
    // Dangling target
    flow.edges.push(Edge::new("a", "out", "ghost", "in"));
    // Two mappings into b.in
    flow.edges.push(
        Edge::new("a", "out", "b", "in")
            .with_mappings(vec![Mapping::new("out", "in"), Mapping::new("out", "in")]),
    );

    let report = validate_flow(&flow);
    assert!(!report.is_valid());
    assert!(report
        .violations
        .iter()
        .any(|v| v.error == FlowError::NodeNotFound("ghost".into())));
    assert!(report.violations.iter().any(|v| v.subject == Subject::Node("b".into())
        && matches!(v.error, FlowError::InputConflict { .. })));
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_cycle_detected_after_editing() {
    let mut graph = chain(3);
    // Cycles are allowed while editing
    graph.connect(Edge::new("p-3", "out", "p-1", "in")).unwrap();

    assert!(matches!(graph.execution_order(), Err(FlowError::CyclicGraph { .. })));
    let report = graph.validate();
    assert!(report
        .violations
        .iter()
        .any(|v| v.subject == Subject::Flow && matches!(v.error, FlowError::CyclicGraph { .. })));
}

#[test]
fn test_empty_flow_is_valid() {
    let graph = FlowGraph::new("empty");
    assert!(graph.validate().is_valid());
    assert!(graph.execution_order().unwrap().is_empty());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_workspace_round_trip_preserves_flow() {
    let dir = TempDir::new().unwrap();
    let mut ws = Workspace::new();
    let graph = chain(4);
    let flow = graph.flow().clone();
    ws.put_graph(graph);
    ws.save(dir.path()).unwrap();

    let loaded = Workspace::load(dir.path()).unwrap();
    assert_eq!(loaded.flow("flow:chain"), Some(&flow));
    assert_eq!(loaded.graph("flow:chain").unwrap().edge_count(), 3);
}

#[test]
fn test_ui_wire_shape() {
    // Camel-case handles, as an editor sends them
    let json = r#"{
        "id": "flow:ui",
        "name": "ui",
        "nodes": [
            {"id": "a", "type": "function", "position": {"x": 0, "y": 0},
             "data": {"name": "A", "inputs": [], "outputs": [{"name": "out", "type": "string"}]}},
            {"id": "b", "position": {"x": 100, "y": 0},
             "data": {"name": "B", "inputs": [{"name": "in", "type": "any"}], "outputs": []}}
        ],
        "edges": [
            {"id": "e1", "source": "a", "target": "b", "sourceHandle": "out", "targetHandle": "in",
             "data": {"mappings": [{"source": "out", "target": "in"}]}}
        ]
    }"#;
    let flow: Flow = serde_json::from_str(json).unwrap();
    assert_eq!(flow.nodes[1].node_type, "function");
    assert!(validate_flow(&flow).is_valid());

    let back = serde_json::to_value(&flow).unwrap();
    assert_eq!(back["edges"][0]["sourceHandle"], "out");
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_plain_connection_iff_equal_or_any(from in port_type(), to in port_type()) {
        let expected = from == to || from == PortType::Any || to == PortType::Any;
        prop_assert_eq!(check_connection(from, to, None).is_ok(), expected);
    }

    #[test]
    fn prop_exact_transform_always_connects(from in port_type(), to in port_type()) {
        let t = Transform::cast(from, to);
        prop_assert!(check_connection(from, to, Some(&t)).is_ok());
    }

    #[test]
    fn prop_execution_order_respects_edges(
        n in 2usize..12,
        raw_edges in prop::collection::vec((0usize..12, 0usize..12), 0..30),
    ) {
        // Only forward edges i -> j with i < j, so the graph is acyclic
        let f = passthrough(PortType::Any);
        let mut graph = FlowGraph::new("dag");
        for i in 0..n {
            graph.add_node(Node::from_function(format!("n{i}"), &f, Position::default())).unwrap();
        }
        let mut fed = HashSet::new();
        for (a, b) in raw_edges {
            let (a, b) = (a % n, b % n);
            // One mapping per input keeps the flow free of input conflicts
            if a < b && fed.insert(b) {
                graph.connect(Edge::new(format!("n{a}"), "out", format!("n{b}"), "in")).unwrap();
            }
        }

        prop_assert!(graph.validate().is_valid());
        let order = graph.execution_order().unwrap();
        prop_assert_eq!(order.len(), n);
        let pos: HashMap<&str, usize> = order.iter().enumerate().map(|(i, node)| (node.id.as_str(), i)).collect();
        for edge in graph.edges() {
            prop_assert!(pos[edge.source.as_str()] < pos[edge.target.as_str()]);
        }
    }

    #[test]
    fn prop_edge_id_stable(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        prop_assert_eq!(
            Edge::generate_id(&a, "out", &b, "in"),
            Edge::new(a.clone(), "out", b.clone(), "in").id
        );
    }
}
