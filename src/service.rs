use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{self, ParsedGraph};
use crate::error::{EngineError, Result};
use crate::invariants;
use crate::models::{
    AddEdgePayload, AddNodePayload, CreateGraphPayload, EdgeId, Graph, GraphEdge, GraphId,
    GraphNode, GraphSummary, ListGraphsQuery, NodeId, Paged, ReplaceFromTextPayload,
    ValidationError,
};
use crate::store::GraphStore;

/// High-level graph actions for embedding callers.
///
/// Mirrors the service methods one-to-one so a request layer can
/// deserialize a tagged operation and dispatch it with [`GraphService::execute`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum GraphOperation {
    Create {
        payload: CreateGraphPayload,
    },
    ReplaceFromText {
        graph_id: GraphId,
        payload: ReplaceFromTextPayload,
    },
    AddNode {
        graph_id: GraphId,
        payload: AddNodePayload,
    },
    AddEdge {
        graph_id: GraphId,
        payload: AddEdgePayload,
    },
    RemoveNode {
        graph_id: GraphId,
        node_id: NodeId,
    },
    RemoveEdge {
        graph_id: GraphId,
        edge_id: EdgeId,
    },
    Get {
        graph_id: GraphId,
    },
    List {
        query: ListGraphsQuery,
    },
    Delete {
        graph_id: GraphId,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GraphOperationResult {
    Graph {
        graph: Graph,
    },
    GraphsPage {
        page: u32,
        limit: u32,
        items: Vec<GraphSummary>,
    },
    Deleted,
}

/// Mutation authority over stored graphs.
///
/// Every operation follows the same transactional pattern: compute the
/// candidate state, validate it, and commit only when acceptable, leaving
/// the prior state untouched on rejection. Methods take `&mut self`, so a
/// caller that shares the service across writers must serialize access;
/// two interleaved read-validate-write sequences on the same graph would
/// let the second write clobber the first.
#[derive(Debug, Default)]
pub struct GraphService {
    store: GraphStore,
}

impl GraphService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: GraphStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn execute(&mut self, operation: GraphOperation) -> Result<GraphOperationResult> {
        match operation {
            GraphOperation::Create { payload } => {
                let graph = self.create_graph(payload)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::ReplaceFromText { graph_id, payload } => {
                let graph = self.replace_from_text(graph_id, payload)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::AddNode { graph_id, payload } => {
                let graph = self.add_node(graph_id, payload)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::AddEdge { graph_id, payload } => {
                let graph = self.add_edge(graph_id, payload)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::RemoveNode { graph_id, node_id } => {
                let graph = self.remove_node(graph_id, node_id)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::RemoveEdge { graph_id, edge_id } => {
                let graph = self.remove_edge(graph_id, edge_id)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::Get { graph_id } => {
                let graph = self.get_graph(graph_id)?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::List { query } => {
                let page = self.list_graphs(&query);
                Ok(GraphOperationResult::GraphsPage {
                    page: page.page,
                    limit: page.limit,
                    items: page.items,
                })
            }
            GraphOperation::Delete { graph_id } => {
                self.delete_graph(graph_id)?;
                Ok(GraphOperationResult::Deleted)
            }
        }
    }

    /// Create a graph, empty or seeded from adjacency text.
    ///
    /// Always succeeds: the codec never hard-fails, and a parsed set that
    /// still encodes a cycle is committed with `is_valid = false` rather
    /// than rejected.
    pub fn create_graph(&mut self, payload: CreateGraphPayload) -> Result<Graph> {
        let name = payload.normalized_name()?;
        let (nodes, edges, adjacency_text) = match payload.initial_text {
            Some(text) => {
                let (nodes, edges) = materialize(codec::parse(&text));
                (nodes, edges, text)
            }
            None => (Vec::new(), Vec::new(), String::new()),
        };

        let result = invariants::validate(&nodes, &edges);
        let timestamp = now();
        let graph = Graph {
            id: GraphId(Uuid::new_v4()),
            name,
            nodes,
            edges,
            adjacency_text,
            is_valid: result.is_valid,
            validation_errors: result.errors,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tracing::info!(graph_id = %graph.id, valid = graph.is_valid, "created graph");
        self.store.insert(graph.clone());
        Ok(graph)
    }

    /// Replace the whole node/edge set from adjacency text.
    ///
    /// The candidate set is validated as a whole; on rejection the stored
    /// graph is unchanged. On success the caller's text is kept verbatim
    /// as the adjacency view, preserving their formatting.
    pub fn replace_from_text(
        &mut self,
        graph_id: GraphId,
        payload: ReplaceFromTextPayload,
    ) -> Result<Graph> {
        let graph = self.require_graph(graph_id)?;
        let (nodes, edges) = materialize(codec::parse(&payload.text));
        let result = invariants::validate(&nodes, &edges);
        if !result.is_valid {
            tracing::debug!(
                graph_id = %graph_id,
                violations = result.errors.len(),
                "rejected adjacency text replacement"
            );
            return Err(EngineError::invalid_with_violations(
                "invalid_adjacency_list",
                "Invalid adjacency list format",
                result.errors,
                anyhow!("replacement text for graph {} failed validation", graph_id),
            ));
        }

        let mut updated = graph.clone();
        updated.nodes = nodes;
        updated.edges = edges;
        updated.adjacency_text = payload.text;
        updated.is_valid = true;
        updated.validation_errors = Vec::new();
        updated.updated_at = now();
        tracing::debug!(graph_id = %graph_id, "replaced graph from adjacency text");
        self.store.insert(updated.clone());
        Ok(updated)
    }

    /// Add a node, auto-assigning a label when none is given.
    ///
    /// An isolated node can neither create a cycle nor dangle an edge, so
    /// this cannot invalidate the graph; it only fails on a label that is
    /// malformed or already taken.
    pub fn add_node(&mut self, graph_id: GraphId, payload: AddNodePayload) -> Result<Graph> {
        let graph = self.require_graph(graph_id)?;
        let label = match payload.label {
            Some(label) => {
                let label = label.trim().to_string();
                if !codec::is_valid_label(&label) {
                    return Err(EngineError::invalid_with_code(
                        "invalid_node_label",
                        "Node labels may only contain letters, numbers, underscores, and dashes",
                        anyhow!("rejected label {:?} for graph {}", label, graph_id),
                    ));
                }
                if graph.node_by_label(&label).is_some() {
                    return Err(EngineError::invalid_with_code(
                        "duplicate_node_label",
                        "Node label already exists",
                        anyhow!("label {:?} already used in graph {}", label, graph_id),
                    ));
                }
                label
            }
            None => next_free_label(&graph.nodes),
        };

        let mut updated = graph.clone();
        updated.nodes.push(GraphNode {
            id: NodeId(Uuid::new_v4()),
            label,
            x: payload.x,
            y: payload.y,
        });
        Ok(self.commit_recomputed(updated))
    }

    /// Add a directed edge between two existing nodes.
    ///
    /// Cheap pre-checks (missing endpoint, self-loop, duplicate) reject
    /// before a candidate is even built; the surviving candidate is then
    /// validated in full, so an edge that would close a cycle is rejected
    /// with the offending path attached.
    pub fn add_edge(&mut self, graph_id: GraphId, payload: AddEdgePayload) -> Result<Graph> {
        let graph = self.require_graph(graph_id)?;
        let AddEdgePayload {
            source_id,
            target_id,
        } = payload;

        if graph.node(source_id).is_none() || graph.node(target_id).is_none() {
            return Err(EngineError::invalid_with_code(
                "edge_endpoint_missing",
                "Source or target node does not exist",
                anyhow!(
                    "edge {} -> {} references a node missing from graph {}",
                    source_id,
                    target_id,
                    graph_id
                ),
            ));
        }
        if source_id == target_id {
            return Err(EngineError::invalid_with_code(
                "self_loop_not_allowed",
                "Self-loops are not allowed",
                anyhow!("self-loop on node {} in graph {}", source_id, graph_id),
            ));
        }
        if graph
            .edges
            .iter()
            .any(|edge| edge.source_id == source_id && edge.target_id == target_id)
        {
            return Err(EngineError::invalid_with_code(
                "edge_already_exists",
                "Edge already exists",
                anyhow!(
                    "duplicate edge {} -> {} in graph {}",
                    source_id,
                    target_id,
                    graph_id
                ),
            ));
        }

        let mut candidate_edges = graph.edges.clone();
        candidate_edges.push(GraphEdge {
            id: EdgeId(Uuid::new_v4()),
            source_id,
            target_id,
        });
        let result = invariants::validate(&graph.nodes, &candidate_edges);
        if !result.is_valid {
            if result
                .errors
                .iter()
                .any(|error| matches!(error, ValidationError::CycleDetected { .. }))
            {
                // A normal, expected outcome of user action.
                tracing::debug!(
                    graph_id = %graph_id,
                    source = %source_id,
                    target = %target_id,
                    "rejected edge that would create a cycle"
                );
                return Err(EngineError::invalid_with_violations(
                    "edge_would_create_cycle",
                    "Adding this edge would create a cycle",
                    result.errors,
                    anyhow!(
                        "edge {} -> {} closes a cycle in graph {}",
                        source_id,
                        target_id,
                        graph_id
                    ),
                ));
            }
            // The pre-checks rule out every structural error other than a
            // cycle; anything else indicates a defect in the engine.
            tracing::error!(
                graph_id = %graph_id,
                errors = ?result.errors,
                "candidate edge set failed validation past the pre-checks"
            );
            return Err(EngineError::internal(
                "Graph update failed an internal consistency check",
                anyhow!(
                    "unexpected violations adding edge to graph {}: {:?}",
                    graph_id,
                    result.errors
                ),
            ));
        }

        let mut updated = graph.clone();
        updated.edges = candidate_edges;
        Ok(self.commit_recomputed(updated))
    }

    /// Remove a node and cascade-delete every edge touching it.
    pub fn remove_node(&mut self, graph_id: GraphId, node_id: NodeId) -> Result<Graph> {
        let graph = self.require_graph(graph_id)?;
        if graph.node(node_id).is_none() {
            return Err(EngineError::not_found(
                "Node not found",
                anyhow!("node {} is not part of graph {}", node_id, graph_id),
            ));
        }

        let mut updated = graph.clone();
        updated.nodes.retain(|node| node.id != node_id);
        updated
            .edges
            .retain(|edge| edge.source_id != node_id && edge.target_id != node_id);
        Ok(self.commit_recomputed(updated))
    }

    pub fn remove_edge(&mut self, graph_id: GraphId, edge_id: EdgeId) -> Result<Graph> {
        let graph = self.require_graph(graph_id)?;
        if graph.edge(edge_id).is_none() {
            return Err(EngineError::not_found(
                "Edge not found",
                anyhow!("edge {} is not part of graph {}", edge_id, graph_id),
            ));
        }

        let mut updated = graph.clone();
        updated.edges.retain(|edge| edge.id != edge_id);
        Ok(self.commit_recomputed(updated))
    }

    pub fn get_graph(&self, graph_id: GraphId) -> Result<Graph> {
        self.store
            .get(graph_id)
            .cloned()
            .ok_or_else(|| graph_not_found(graph_id))
    }

    pub fn list_graphs(&self, query: &ListGraphsQuery) -> Paged<GraphSummary> {
        let (page, limit) = query.pagination();
        let items = self
            .store
            .summaries()
            .into_iter()
            .skip((page as usize - 1) * limit as usize)
            .take(limit as usize)
            .collect();
        Paged { page, limit, items }
    }

    /// Delete a graph; its nodes and edges go with it.
    pub fn delete_graph(&mut self, graph_id: GraphId) -> Result<()> {
        if self.store.remove(graph_id).is_none() {
            return Err(graph_not_found(graph_id));
        }
        tracing::info!(graph_id = %graph_id, "deleted graph");
        Ok(())
    }

    fn require_graph(&self, graph_id: GraphId) -> Result<&Graph> {
        self.store
            .get(graph_id)
            .ok_or_else(|| graph_not_found(graph_id))
    }

    /// Commit a structurally mutated graph, re-deriving the cached views.
    ///
    /// Structural removals and isolated additions always commit; the
    /// validation state is recomputed rather than assumed, so a graph that
    /// carried errors from a seeded creation can become valid again here.
    fn commit_recomputed(&mut self, mut graph: Graph) -> Graph {
        let result = invariants::validate(&graph.nodes, &graph.edges);
        graph.adjacency_text = codec::generate(&graph.nodes, &graph.edges);
        graph.is_valid = result.is_valid;
        graph.validation_errors = result.errors;
        graph.updated_at = now();
        tracing::debug!(
            graph_id = %graph.id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            valid = graph.is_valid,
            "committed graph mutation"
        );
        self.store.insert(graph.clone());
        graph
    }
}

fn graph_not_found(graph_id: GraphId) -> EngineError {
    EngineError::not_found(
        "Graph not found",
        anyhow!("no graph stored under id {}", graph_id),
    )
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Turn parsed label-level descriptors into records with fresh ids.
///
/// Every parsed edge endpoint refers to a declared node, so resolution
/// cannot drop edges for well-formed parser output.
fn materialize(parsed: ParsedGraph) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut ids: HashMap<String, NodeId> = HashMap::with_capacity(parsed.nodes.len());
    let nodes = parsed
        .nodes
        .into_iter()
        .map(|node| {
            let id = NodeId(Uuid::new_v4());
            ids.insert(node.label.clone(), id);
            GraphNode {
                id,
                label: node.label,
                x: node.x,
                y: node.y,
            }
        })
        .collect();

    let edges = parsed
        .edges
        .into_iter()
        .filter_map(|edge| {
            Some(GraphEdge {
                id: EdgeId(Uuid::new_v4()),
                source_id: *ids.get(&edge.source_label)?,
                target_id: *ids.get(&edge.target_label)?,
            })
        })
        .collect();

    (nodes, edges)
}

/// First unused single uppercase letter, then `N1`, `N2`, ...
fn next_free_label(nodes: &[GraphNode]) -> String {
    let taken: HashSet<&str> = nodes.iter().map(|node| node.label.as_str()).collect();
    for letter in b'A'..=b'Z' {
        let candidate = (letter as char).to_string();
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
    }
    let mut suffix = 1usize;
    loop {
        let candidate = format!("N{suffix}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        suffix += 1;
    }
}
