use crate::error::{GraphError, Result};
use crate::types::{EdgeKind, Graph};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

/// Read-only adjacency index over a graph's dependency edges, for the
/// presentation layer's focus/highlight queries.
///
/// Built once from a finished [`Graph`]; rebuild after re-ingestion.
/// Parent-child edges are excluded - a focus view follows imports, not
/// the directory tree.
pub struct GraphIndex {
    graph: DiGraph<String, f64>,
    by_id: HashMap<String, NodeIndex>,
}

impl GraphIndex {
    #[must_use]
    pub fn build(source: &Graph) -> Self {
        let mut graph = DiGraph::new();
        let mut by_id = HashMap::with_capacity(source.node_count());

        for node in source.nodes() {
            let idx = graph.add_node(node.id.clone());
            by_id.insert(node.id.clone(), idx);
        }
        for edge in source.edges() {
            if edge.kind != EdgeKind::Dependency {
                continue;
            }
            if let (Some(&from), Some(&to)) = (by_id.get(&edge.source), by_id.get(&edge.target)) {
                graph.add_edge(from, to, edge.strength);
            }
        }

        Self { graph, by_id }
    }

    /// Nodes reachable within `max_depth` dependency hops, following
    /// edges in both directions (importers and imports alike).
    ///
    /// Returns `(id, distance)` pairs sorted by distance then id, the
    /// start node excluded.
    pub fn neighbors_within(&self, id: &str, max_depth: usize) -> Result<Vec<(String, usize)>> {
        let start = *self
            .by_id
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;

        let mut distances: HashMap<NodeIndex, usize> = HashMap::new();
        distances.insert(start, 0);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            let depth = distances[&current];
            if depth == max_depth {
                continue;
            }
            for direction in [Direction::Outgoing, Direction::Incoming] {
                for next in self.graph.neighbors_directed(current, direction) {
                    distances.entry(next).or_insert_with(|| {
                        queue.push_back(next);
                        depth + 1
                    });
                }
            }
        }

        distances.remove(&start);
        let mut related: Vec<(String, usize)> = distances
            .into_iter()
            .map(|(idx, distance)| (self.graph[idx].clone(), distance))
            .collect();
        related.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(related)
    }
}
