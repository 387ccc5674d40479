use std::collections::HashMap;

use crate::models::{Graph, GraphId, GraphSummary};

/// Id-indexed graph arena.
///
/// Stands in for the persistence layer, which is the caller's concern.
/// Graphs are stored whole; the service writes full replacement states
/// after validation, so a graph in the store is always a committed state.
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: HashMap<GraphId, Graph>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, graph: Graph) {
        self.graphs.insert(graph.id, graph);
    }

    pub fn get(&self, graph_id: GraphId) -> Option<&Graph> {
        self.graphs.get(&graph_id)
    }

    pub fn remove(&mut self, graph_id: GraphId) -> Option<Graph> {
        self.graphs.remove(&graph_id)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Summaries ordered by creation time, then id for a stable tiebreak.
    pub fn summaries(&self) -> Vec<GraphSummary> {
        let mut summaries: Vec<GraphSummary> = self.graphs.values().map(GraphSummary::from).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.0.cmp(&b.id.0)));
        summaries
    }
}
