use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct GraphId(pub Uuid);

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GraphId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for GraphId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub Uuid);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for NodeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EdgeId(pub Uuid);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EdgeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for EdgeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// A labeled node placed on the editor canvas.
///
/// The id is assigned at creation and never changes; the label is unique
/// within its graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// A directed edge referencing its endpoints by id.
///
/// Endpoints are weak references: removing a node leaves no dangling
/// pointer, only an id that validation reports as invalid. Node removal
/// cascade-deletes every edge touching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationError {
    #[serde(rename_all = "camelCase")]
    InvalidNodeReference {
        edge_id: EdgeId,
        missing_node_id: NodeId,
    },
    #[serde(rename_all = "camelCase")]
    SelfLoop { edge_id: EdgeId, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    DuplicateEdge { source_id: NodeId, target_id: NodeId },
    #[serde(rename_all = "camelCase")]
    CycleDetected { cycle_path: Vec<NodeId> },
}

impl ValidationError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidNodeReference { .. } => "graph_invalid_node_reference",
            ValidationError::SelfLoop { .. } => "graph_self_loop",
            ValidationError::DuplicateEdge { .. } => "graph_duplicate_edge",
            ValidationError::CycleDetected { .. } => "graph_cycle_detected",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            ValidationError::InvalidNodeReference { .. } => {
                "Edge references a node that does not exist"
            }
            ValidationError::SelfLoop { .. } => "Self-loop edges are not allowed",
            ValidationError::DuplicateEdge { .. } => "Duplicate edges are not allowed",
            ValidationError::CycleDetected { .. } => "Graph must be acyclic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// A stored graph together with its derived views.
///
/// `adjacency_text` is a cached rendering of `(nodes, edges)` and never the
/// source of truth for structural queries. `is_valid` holds exactly when
/// `validation_errors` is empty, and both always describe the committed
/// node/edge set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub id: GraphId,
    pub name: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub adjacency_text: String,
    pub is_valid: bool,
    pub validation_errors: Vec<ValidationError>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Graph {
    pub fn node(&self, node_id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn edge(&self, edge_id: EdgeId) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == edge_id)
    }

    pub fn node_by_label(&self, label: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.label == label)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub id: GraphId,
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub is_valid: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&Graph> for GraphSummary {
    fn from(graph: &Graph) -> Self {
        Self {
            id: graph.id,
            name: graph.name.clone(),
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
            is_valid: graph.is_valid,
            created_at: graph.created_at,
            updated_at: graph.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub page: u32,
    pub limit: u32,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGraphsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListGraphsQuery {
    pub fn pagination(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(25).clamp(1, 200);
        (page, limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGraphPayload {
    pub name: String,
    pub initial_text: Option<String>,
}

impl CreateGraphPayload {
    pub fn normalized_name(&self) -> Result<String> {
        normalize_graph_name(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceFromTextPayload {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNodePayload {
    pub x: f64,
    pub y: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEdgePayload {
    pub source_id: NodeId,
    pub target_id: NodeId,
}

pub(crate) fn normalize_graph_name(name: &str) -> Result<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(EngineError::invalid(
            "Graph name is required",
            anyhow!("empty graph name"),
        ));
    }
    Ok(name)
}
