use std::collections::HashMap;

use crate::models::{GraphEdge, GraphNode, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visiting,
    Visited,
}

pub fn adjacency_map(nodes: &[GraphNode], edges: &[GraphEdge]) -> HashMap<NodeId, Vec<NodeId>> {
    let mut adjacency = HashMap::with_capacity(nodes.len());
    for node in nodes {
        adjacency.insert(node.id, Vec::new());
    }
    for edge in edges {
        if !adjacency.contains_key(&edge.target_id) {
            // Best-effort behavior: skip dangling edges instead of failing
            // the whole computation.
            continue;
        }
        if let Some(children) = adjacency.get_mut(&edge.source_id) {
            children.push(edge.target_id);
        }
    }
    adjacency
}

/// Find the first cycle reachable in DFS order, if any.
///
/// Nodes are taken as roots in slice order and children in edge insertion
/// order, so the result is deterministic for an unchanged node/edge set.
/// The returned path starts at the first occurrence of the repeated node
/// and repeats it at the end to close the loop. Only the first cycle is
/// reported even when several disjoint cycles exist.
pub fn find_cycle(
    nodes: &[GraphNode],
    adjacency: &HashMap<NodeId, Vec<NodeId>>,
) -> Option<Vec<NodeId>> {
    let mut state: HashMap<NodeId, VisitState> = nodes
        .iter()
        .map(|node| (node.id, VisitState::Unvisited))
        .collect();
    for root in nodes {
        if state.get(&root.id) != Some(&VisitState::Unvisited) {
            continue;
        }

        // Explicit DFS stack: (node, index of the next child to explore).
        let mut frames: Vec<(NodeId, usize)> = vec![(root.id, 0)];
        let mut path: Vec<NodeId> = vec![root.id];
        state.insert(root.id, VisitState::Visiting);

        while let Some((node_id, child_index)) = frames.last_mut() {
            let children = adjacency.get(node_id).map(Vec::as_slice).unwrap_or(&[]);
            if *child_index >= children.len() {
                state.insert(*node_id, VisitState::Visited);
                frames.pop();
                path.pop();
                continue;
            }

            let child = children[*child_index];
            *child_index += 1;

            match state.get(&child) {
                Some(VisitState::Visiting) => {
                    let start = path
                        .iter()
                        .position(|node_id| *node_id == child)
                        .unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(child);
                    return Some(cycle);
                }
                Some(VisitState::Unvisited) => {
                    state.insert(child, VisitState::Visiting);
                    frames.push((child, 0));
                    path.push(child);
                }
                // Fully processed or unknown to this node set.
                _ => {}
            }
        }
    }

    None
}
