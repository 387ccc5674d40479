use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{GraphEdge, GraphNode};

static NODE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("node label pattern should compile"));

/// Grid layout for nodes that come in without coordinates: five per row.
const GRID_ORIGIN_X: f64 = 100.0;
const GRID_ORIGIN_Y: f64 = 100.0;
const GRID_STEP_X: f64 = 150.0;
const GRID_STEP_Y: f64 = 100.0;
const GRID_COLUMNS: usize = 5;

pub fn is_valid_label(label: &str) -> bool {
    NODE_LABEL.is_match(label)
}

/// A node descriptor produced by [`parse`], before ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNode {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// An edge descriptor produced by [`parse`], endpoints still by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEdge {
    pub source_label: String,
    pub target_label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGraph {
    pub nodes: Vec<ParsedNode>,
    pub edges: Vec<ParsedEdge>,
}

/// Parse free-form adjacency-list text into candidate nodes and edges.
///
/// One line per node, `Label: Target1, Target2` or `Label:` for a sink.
/// Parsing is lenient and never fails: blank lines, lines without a `:`
/// separator, and labels that do not match `[a-zA-Z0-9_-]+` are skipped.
/// A target equal to its own source is dropped here rather than reported,
/// and duplicate `(source, target)` pairs collapse to one edge, so the
/// only structural error a parsed graph can still carry is a cycle.
pub fn parse(text: &str) -> ParsedGraph {
    let mut node_order: Vec<String> = Vec::new();
    let mut seen_labels: HashSet<String> = HashSet::new();
    let mut seen_edges: HashSet<(String, String)> = HashSet::new();
    let mut edges: Vec<ParsedEdge> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((source, targets)) = line.split_once(':') else {
            continue;
        };
        let source = source.trim();
        if !is_valid_label(source) {
            continue;
        }
        declare(source, &mut node_order, &mut seen_labels);

        for target in targets.split(',') {
            let target = target.trim();
            if !is_valid_label(target) {
                continue;
            }
            declare(target, &mut node_order, &mut seen_labels);
            if target == source {
                continue;
            }
            let pair = (source.to_string(), target.to_string());
            if seen_edges.insert(pair) {
                edges.push(ParsedEdge {
                    source_label: source.to_string(),
                    target_label: target.to_string(),
                });
            }
        }
    }

    let nodes = node_order
        .into_iter()
        .enumerate()
        .map(|(index, label)| ParsedNode {
            label,
            x: GRID_ORIGIN_X + (index % GRID_COLUMNS) as f64 * GRID_STEP_X,
            y: GRID_ORIGIN_Y + (index / GRID_COLUMNS) as f64 * GRID_STEP_Y,
        })
        .collect();

    ParsedGraph { nodes, edges }
}

fn declare(label: &str, order: &mut Vec<String>, seen: &mut HashSet<String>) {
    if seen.insert(label.to_string()) {
        order.push(label.to_string());
    }
}

/// Render the canonical adjacency-list text for a node/edge set.
///
/// One line per node in slice order, targets in edge order. Edges with an
/// endpoint that resolves to no node are skipped best-effort rather than
/// failing the whole rendering.
pub fn generate(nodes: &[GraphNode], edges: &[GraphEdge]) -> String {
    let labels: HashMap<_, _> = nodes
        .iter()
        .map(|node| (node.id, node.label.as_str()))
        .collect();

    let mut lines = Vec::with_capacity(nodes.len());
    for node in nodes {
        let targets: Vec<&str> = edges
            .iter()
            .filter(|edge| edge.source_id == node.id)
            .filter_map(|edge| labels.get(&edge.target_id).copied())
            .collect();
        if targets.is_empty() {
            lines.push(format!("{}:", node.label));
        } else {
            lines.push(format!("{}: {}", node.label, targets.join(", ")));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{EdgeId, NodeId};

    fn node(id: u128, label: &str) -> GraphNode {
        GraphNode {
            id: NodeId(Uuid::from_u128(id)),
            label: label.to_string(),
            x: 0.0,
            y: 0.0,
        }
    }

    fn edge(id: u128, source: &GraphNode, target: &GraphNode) -> GraphEdge {
        GraphEdge {
            id: EdgeId(Uuid::from_u128(id)),
            source_id: source.id,
            target_id: target.id,
        }
    }

    #[test]
    fn parses_diamond_graph() {
        let parsed = parse("A: B, C\nB: D\nC: D\nD:");
        assert_eq!(parsed.nodes.len(), 4);
        assert_eq!(parsed.edges.len(), 4);
        let labels: Vec<&str> = parsed.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn first_mention_wins_grid_position() {
        let parsed = parse("A: B\nB: C\nC:\nD:\nE:\nF:");
        assert_eq!(parsed.nodes[0].x, 100.0);
        assert_eq!(parsed.nodes[0].y, 100.0);
        assert_eq!(parsed.nodes[1].x, 250.0);
        assert_eq!(parsed.nodes[4].x, 700.0);
        // Sixth node wraps onto the second grid row.
        assert_eq!(parsed.nodes[5].x, 100.0);
        assert_eq!(parsed.nodes[5].y, 200.0);
    }

    #[test]
    fn self_referencing_target_is_filtered() {
        let parsed = parse("A: A");
        assert_eq!(parsed.nodes.len(), 1);
        assert!(parsed.edges.is_empty());
    }

    #[test]
    fn lines_without_separator_are_skipped() {
        let parsed = parse("A: B\nnot a node line\nC:");
        let labels: Vec<&str> = parsed.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn invalid_source_label_skips_the_line() {
        let parsed = parse("bad label!: B\nC: D");
        let labels: Vec<&str> = parsed.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "D"]);
        assert_eq!(parsed.edges.len(), 1);
    }

    #[test]
    fn invalid_target_tokens_are_dropped_individually() {
        let parsed = parse("A: B, bad token, C");
        let labels: Vec<&str> = parsed.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(parsed.edges.len(), 2);
    }

    #[test]
    fn duplicate_target_pairs_collapse() {
        let parsed = parse("A: B, B\nA: B");
        assert_eq!(parsed.edges.len(), 1);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let parsed = parse("\nA: B\n\n\nB:\n");
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.edges.len(), 1);
    }

    #[test]
    fn generates_one_line_per_node() {
        let a = node(1, "A");
        let b = node(2, "B");
        let c = node(3, "C");
        let edges = vec![edge(10, &a, &b), edge(11, &a, &c)];
        let text = generate(&[a, b, c], &edges);
        assert_eq!(text, "A: B, C\nB:\nC:");
    }

    #[test]
    fn generate_skips_dangling_edge_endpoints() {
        let a = node(1, "A");
        let ghost = node(2, "ghost");
        let edges = vec![edge(10, &a, &ghost)];
        let text = generate(std::slice::from_ref(&a), &edges);
        assert_eq!(text, "A:");
    }

    #[test]
    fn generate_then_parse_round_trips() {
        let a = node(1, "build");
        let b = node(2, "test");
        let c = node(3, "deploy");
        let edges = vec![edge(10, &a, &b), edge(11, &b, &c)];
        let nodes = vec![a, b, c];

        let text = generate(&nodes, &edges);
        let reparsed = parse(&text);

        let labels: Vec<&str> = reparsed.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["build", "test", "deploy"]);
        assert_eq!(
            reparsed.edges,
            vec![
                ParsedEdge {
                    source_label: "build".to_string(),
                    target_label: "test".to_string(),
                },
                ParsedEdge {
                    source_label: "test".to_string(),
                    target_label: "deploy".to_string(),
                },
            ]
        );
    }
}
