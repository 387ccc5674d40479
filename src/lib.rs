pub mod algorithms;
pub mod codec;
pub mod error;
pub mod invariants;
pub mod models;
pub mod service;
pub mod store;

pub mod prelude {
    pub use crate::algorithms::{adjacency_map, find_cycle};
    pub use crate::codec::{ParsedEdge, ParsedGraph, ParsedNode, generate, is_valid_label, parse};
    pub use crate::error::{EngineError, ErrorKind, Result};
    pub use crate::invariants::{ensure_valid, validate, validation_errors};
    pub use crate::models::{
        AddEdgePayload, AddNodePayload, CreateGraphPayload, EdgeId, Graph, GraphEdge, GraphId,
        GraphNode, GraphSummary, ListGraphsQuery, NodeId, Paged, ReplaceFromTextPayload,
        ValidationError, ValidationResult,
    };
    pub use crate::service::{GraphOperation, GraphOperationResult, GraphService};
    pub use crate::store::GraphStore;
}
