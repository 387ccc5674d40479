//! End-to-end editing sessions against the graph service.

use std::collections::HashSet;

use proptest::prelude::*;
use uuid::Uuid;

use dagedit::prelude::*;

fn create(service: &mut GraphService, name: &str, text: &str) -> Graph {
    service
        .create_graph(CreateGraphPayload {
            name: name.to_string(),
            initial_text: Some(text.to_string()),
        })
        .expect("create should succeed")
}

fn id_of(graph: &Graph, label: &str) -> NodeId {
    graph
        .node_by_label(label)
        .unwrap_or_else(|| panic!("node {label} should exist"))
        .id
}

#[test]
fn full_editing_session() {
    let mut service = GraphService::new();

    // Start from text, as the editor's import path does.
    let graph = create(&mut service, "release plan", "A: B, C\nB: D\nC: D\nD:");
    assert!(graph.is_valid);
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 4);

    // Grow the graph structurally.
    let graph = service
        .add_node(
            graph.id,
            AddNodePayload {
                x: 400.0,
                y: 300.0,
                label: Some("ship".to_string()),
            },
        )
        .expect("add node should succeed");
    let graph = service
        .add_edge(
            graph.id,
            AddEdgePayload {
                source_id: id_of(&graph, "D"),
                target_id: id_of(&graph, "ship"),
            },
        )
        .expect("add edge should succeed");
    assert!(graph.is_valid);
    assert_eq!(graph.edges.len(), 5);

    // A back-edge to an ancestor is rejected and changes nothing.
    let before = service.get_graph(graph.id).expect("graph should exist");
    let err = service
        .add_edge(
            graph.id,
            AddEdgePayload {
                source_id: id_of(&graph, "ship"),
                target_id: id_of(&graph, "A"),
            },
        )
        .expect_err("back-edge should be rejected");
    assert_eq!(err.public, "Adding this edge would create a cycle");
    assert_eq!(
        service.get_graph(graph.id).expect("graph should exist"),
        before
    );

    // Removing a hub node cascades and leaves a clean graph.
    let graph = service
        .remove_node(graph.id, id_of(&graph, "D"))
        .expect("remove should succeed");
    assert!(graph.is_valid);
    assert!(graph.validation_errors.is_empty());
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 2);

    // The cached text always reflects the committed structure.
    let reparsed = parse(&graph.adjacency_text);
    assert_eq!(reparsed.nodes.len(), graph.nodes.len());
    assert_eq!(reparsed.edges.len(), graph.edges.len());
}

#[test]
fn rejected_text_replacement_preserves_the_committed_state() {
    let mut service = GraphService::new();
    let graph = create(&mut service, "draft", "A: B\nB:");
    let before = service.get_graph(graph.id).expect("graph should exist");

    let err = service
        .replace_from_text(
            graph.id,
            ReplaceFromTextPayload {
                text: "A: B\nB: C\nC: A".to_string(),
            },
        )
        .expect_err("cyclic text should be rejected");
    assert_eq!(err.public, "Invalid adjacency list format");
    assert!(
        err.violations
            .iter()
            .any(|v| matches!(v, ValidationError::CycleDetected { .. }))
    );

    let after = service.get_graph(graph.id).expect("graph should exist");
    assert_eq!(after, before);

    // A well-formed replacement goes through afterwards.
    let replaced = service
        .replace_from_text(
            graph.id,
            ReplaceFromTextPayload {
                text: "A: B\nB: C\nC:".to_string(),
            },
        )
        .expect("acyclic text should be accepted");
    assert!(replaced.is_valid);
    assert_eq!(replaced.adjacency_text, "A: B\nB: C\nC:");
}

#[test]
fn operations_dispatch_like_direct_calls() {
    let mut service = GraphService::new();
    let created = service
        .execute(GraphOperation::Create {
            payload: CreateGraphPayload {
                name: "ops".to_string(),
                initial_text: Some("A: B\nB:".to_string()),
            },
        })
        .expect("create should succeed");
    let GraphOperationResult::Graph { graph } = created else {
        panic!("create should return a graph");
    };

    let listed = service
        .execute(GraphOperation::List {
            query: ListGraphsQuery::default(),
        })
        .expect("list should succeed");
    let GraphOperationResult::GraphsPage { items, .. } = listed else {
        panic!("list should return a page");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].node_count, 2);

    let removed = service
        .execute(GraphOperation::RemoveEdge {
            graph_id: graph.id,
            edge_id: graph.edges[0].id,
        })
        .expect("remove edge should succeed");
    let GraphOperationResult::Graph { graph } = removed else {
        panic!("remove edge should return a graph");
    };
    assert!(graph.edges.is_empty());
}

#[test]
fn unknown_graph_ids_surface_not_found() {
    let mut service = GraphService::new();
    let missing = GraphId(Uuid::new_v4());

    let err = service.get_graph(missing).expect_err("should be missing");
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.public, "Graph not found");

    let err = service
        .replace_from_text(
            missing,
            ReplaceFromTextPayload {
                text: "A:".to_string(),
            },
        )
        .expect_err("should be missing");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

proptest! {
    /// Rendering a graph to text and parsing it back preserves the node
    /// labels and the source/target label pairs, for any set of
    /// pattern-conforming labels and any simple edge relation over them.
    #[test]
    fn generate_then_parse_is_structurally_lossless(
        labels in prop::collection::btree_set("[a-zA-Z0-9_-]{1,8}", 1..10),
        pairs in prop::collection::vec((0usize..16, 0usize..16), 0..24),
    ) {
        let labels: Vec<String> = labels.into_iter().collect();
        let nodes: Vec<GraphNode> = labels
            .iter()
            .enumerate()
            .map(|(index, label)| GraphNode {
                id: NodeId(Uuid::from_u128(index as u128 + 1)),
                label: label.clone(),
                x: 0.0,
                y: 0.0,
            })
            .collect();

        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for (a, b) in pairs {
            let (a, b) = (a % nodes.len(), b % nodes.len());
            if a == b {
                continue;
            }
            if seen.insert((a, b)) {
                edges.push(GraphEdge {
                    id: EdgeId(Uuid::from_u128(edges.len() as u128 + 1)),
                    source_id: nodes[a].id,
                    target_id: nodes[b].id,
                });
            }
        }

        let text = generate(&nodes, &edges);
        let parsed = parse(&text);

        let expected_labels: HashSet<&str> = nodes.iter().map(|n| n.label.as_str()).collect();
        let actual_labels: HashSet<&str> = parsed.nodes.iter().map(|n| n.label.as_str()).collect();
        prop_assert_eq!(actual_labels, expected_labels);

        let label_of = |id: NodeId| {
            nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.label.clone())
                .expect("edge endpoints refer to known nodes")
        };
        let expected_edges: HashSet<(String, String)> = edges
            .iter()
            .map(|e| (label_of(e.source_id), label_of(e.target_id)))
            .collect();
        let actual_edges: HashSet<(String, String)> = parsed
            .edges
            .iter()
            .map(|e| (e.source_label.clone(), e.target_label.clone()))
            .collect();
        prop_assert_eq!(actual_edges, expected_edges);
    }
}
