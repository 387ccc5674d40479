use std::collections::{HashMap, HashSet};

use anyhow::anyhow;

use crate::algorithms::{adjacency_map, find_cycle};
use crate::error::{EngineError, Result};
use crate::models::{GraphEdge, GraphNode, NodeId, ValidationError, ValidationResult};

/// Run the structural checks over a candidate node/edge set.
///
/// Checks run in a fixed order and accumulate: every invalid node
/// reference first, then every self-loop, then every duplicate
/// `(source, target)` pair. Cycle detection runs only when the first
/// three checks found nothing, since a dangling or duplicate edge makes
/// a reported cycle path misleading. At most one `CycleDetected` is
/// emitted per call.
pub fn validation_errors(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<ValidationError> {
    let node_ids: HashSet<NodeId> = nodes.iter().map(|node| node.id).collect();
    let mut errors = Vec::new();

    for edge in edges {
        if !node_ids.contains(&edge.source_id) {
            errors.push(ValidationError::InvalidNodeReference {
                edge_id: edge.id,
                missing_node_id: edge.source_id,
            });
        }
        if !node_ids.contains(&edge.target_id) {
            errors.push(ValidationError::InvalidNodeReference {
                edge_id: edge.id,
                missing_node_id: edge.target_id,
            });
        }
    }

    for edge in edges {
        if edge.source_id == edge.target_id {
            errors.push(ValidationError::SelfLoop {
                edge_id: edge.id,
                node_id: edge.source_id,
            });
        }
    }

    let mut seen_pairs: HashMap<(NodeId, NodeId), usize> = HashMap::with_capacity(edges.len());
    for edge in edges {
        let count = seen_pairs
            .entry((edge.source_id, edge.target_id))
            .or_insert(0);
        *count += 1;
        if *count > 1 {
            errors.push(ValidationError::DuplicateEdge {
                source_id: edge.source_id,
                target_id: edge.target_id,
            });
        }
    }

    if errors.is_empty() {
        let adjacency = adjacency_map(nodes, edges);
        if let Some(cycle_path) = find_cycle(nodes, &adjacency) {
            errors.push(ValidationError::CycleDetected { cycle_path });
        }
    }

    errors
}

pub fn validate(nodes: &[GraphNode], edges: &[GraphEdge]) -> ValidationResult {
    let errors = validation_errors(nodes, edges);
    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Map the first violation of a candidate set to an [`EngineError`].
pub fn ensure_valid(nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<()> {
    let errors = validation_errors(nodes, edges);
    if let Some(first) = errors.first() {
        return Err(EngineError::invalid_with_violations(
            first.error_code(),
            first.public_message(),
            errors.clone(),
            anyhow!("graph validation failed: {:?}", errors),
        ));
    }

    Ok(())
}
