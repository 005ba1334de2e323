use crate::error::{GraphError, Result};
use atlas_protocol::{CommitAggregates, FileRecord, LayoutEdge, LayoutNode, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a node represents on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// How an edge was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Inferred from static import analysis.
    Dependency,
    /// Structural folder hierarchy, independent of imports.
    ParentChild,
}

/// One file or folder of the repository snapshot.
///
/// Identity is the repository-relative path, stable across rebuilds.
/// `position`/`velocity` are mutated every simulation tick; `heat_score`
/// is written once per ingestion and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub size: u64,
    /// Unix seconds.
    pub last_modified: i64,
    pub aggregates: CommitAggregates,
    /// Normalized change-risk score in `[0, 1]`; 0 until scored.
    pub heat_score: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    /// User-driven pin: excluded from layout integration when set.
    pub fixed: bool,
    /// Outgoing edge targets. Derived; rebuilt by
    /// [`Graph::recompute_adjacency`], never mutated directly.
    pub dependencies: BTreeSet<String>,
    /// Incoming edge sources - the exact transpose of the edge set.
    /// Derived; rebuilt in full whenever edges change.
    pub dependents: BTreeSet<String>,
}

impl Node {
    #[must_use]
    pub fn file(record: &FileRecord) -> Self {
        Self::new(record.path.clone(), NodeKind::File, record.size, record.last_modified)
    }

    #[must_use]
    pub fn folder(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Folder, 0, 0)
    }

    fn new(id: impl Into<String>, kind: NodeKind, size: u64, last_modified: i64) -> Self {
        Self {
            id: id.into(),
            kind,
            size,
            last_modified,
            aggregates: CommitAggregates::default(),
            heat_score: 0.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            fixed: false,
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }
}

/// Directed edge. Identity is the `(source, target)` pair; inserting the
/// same pair again replaces the stored attributes (last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    /// Visual/physical weight in `(0, 1]`.
    pub strength: f64,
}

/// Aggregate counts, the observable surface for silently dropped edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub files: usize,
    pub folders: usize,
    pub edges: usize,
    pub dependency_edges: usize,
    pub parent_child_edges: usize,
}

/// The graph aggregate for one repository snapshot.
///
/// Owns the node map and the edge map; the pipeline driver owns the
/// graph. Ordered maps keep rebuilds deterministic regardless of input
/// order. The whole aggregate is discarded and rebuilt on re-ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub root_path: String,
    nodes: BTreeMap<String, Node>,
    #[serde(with = "edge_map")]
    edges: BTreeMap<(String, String), Edge>,
}

impl Graph {
    #[must_use]
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Insert a node, replacing any previous node with the same id.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Insert or replace the edge identified by `(source, target)`.
    ///
    /// Both endpoints must already exist in the node map; the builder
    /// enforces this, so a violation here is a programming error surfaced
    /// as [`GraphError::NodeNotFound`].
    pub fn upsert_edge(&mut self, edge: Edge) -> Result<()> {
        if !self.contains(&edge.source) {
            return Err(GraphError::NodeNotFound(edge.source));
        }
        if !self.contains(&edge.target) {
            return Err(GraphError::NodeNotFound(edge.target));
        }
        self.edges
            .insert((edge.source.clone(), edge.target.clone()), edge);
        Ok(())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Rebuild every node's `dependencies`/`dependents` from scratch as
    /// the exact transpose of the current edge set.
    ///
    /// Always a full recompute - edges can be removed as well as added
    /// between calls, so incremental patching would drift. Adjacency
    /// spans both edge kinds; filter by [`EdgeKind`] on the edge list for
    /// dependency-only views.
    pub fn recompute_adjacency(&mut self) {
        for node in self.nodes.values_mut() {
            node.dependencies.clear();
            node.dependents.clear();
        }
        for (source, target) in self.edges.keys() {
            if let Some(node) = self.nodes.get_mut(source) {
                node.dependencies.insert(target.clone());
            }
            if let Some(node) = self.nodes.get_mut(target) {
                node.dependents.insert(source.clone());
            }
        }
    }

    /// Toggle the user-driven layout pin on a node.
    pub fn set_fixed(&mut self, id: &str, fixed: bool) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        node.fixed = fixed;
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            ..GraphStats::default()
        };
        for node in self.nodes.values() {
            match node.kind {
                NodeKind::File => stats.files += 1,
                NodeKind::Folder => stats.folders += 1,
            }
        }
        for edge in self.edges.values() {
            match edge.kind {
                EdgeKind::Dependency => stats.dependency_edges += 1,
                EdgeKind::ParentChild => stats.parent_child_edges += 1,
            }
        }
        stats
    }

    /// Snapshot of node state for the layout worker. The worker owns the
    /// copy; positions come back only through tick messages.
    #[must_use]
    pub fn layout_nodes(&self) -> Vec<LayoutNode> {
        self.nodes
            .values()
            .map(|node| LayoutNode {
                id: node.id.clone(),
                position: node.position,
                fixed: node.fixed,
            })
            .collect()
    }

    /// Edge snapshot for the layout worker.
    #[must_use]
    pub fn layout_edges(&self) -> Vec<LayoutEdge> {
        self.edges
            .values()
            .map(|edge| LayoutEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                strength: edge.strength,
            })
            .collect()
    }

    /// Write a tick's position snapshot back into the node map. Unknown
    /// ids are ignored (the tick may race a rebuild).
    pub fn apply_positions(&mut self, positions: &BTreeMap<String, [f64; 3]>) {
        for (id, position) in positions {
            if let Some(node) = self.nodes.get_mut(id) {
                node.position = Vec3::from_array(*position);
            }
        }
    }
}

/// Edges are keyed by `(source, target)` in memory for structural dedup,
/// but serialize as a plain list for consumers.
mod edge_map {
    use super::Edge;
    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};
    use std::collections::{BTreeMap, BTreeSet};

    pub fn serialize<S: Serializer>(
        edges: &BTreeMap<(String, String), Edge>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(edges.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(String, String), Edge>, D::Error> {
        let list = Vec::<Edge>::deserialize(deserializer)?;
        Ok(list
            .into_iter()
            .map(|edge| ((edge.source.clone(), edge.target.clone()), edge))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_node(id: &str) -> Node {
        Node::new(id, NodeKind::File, 10, 0)
    }

    #[test]
    fn upsert_edge_is_last_write_wins() {
        let mut graph = Graph::new("repo");
        graph.add_node(file_node("a.ts"));
        graph.add_node(file_node("b.ts"));

        graph
            .upsert_edge(Edge {
                source: "a.ts".to_string(),
                target: "b.ts".to_string(),
                kind: EdgeKind::Dependency,
                strength: 0.25,
            })
            .unwrap();
        graph
            .upsert_edge(Edge {
                source: "a.ts".to_string(),
                target: "b.ts".to_string(),
                kind: EdgeKind::Dependency,
                strength: 1.0,
            })
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.strength, 1.0);
    }

    #[test]
    fn upsert_edge_rejects_unknown_endpoints() {
        let mut graph = Graph::new("repo");
        graph.add_node(file_node("a.ts"));

        let err = graph
            .upsert_edge(Edge {
                source: "a.ts".to_string(),
                target: "ghost.ts".to_string(),
                kind: EdgeKind::Dependency,
                strength: 1.0,
            })
            .unwrap_err();
        assert_eq!(err, GraphError::NodeNotFound("ghost.ts".to_string()));
    }

    #[test]
    fn adjacency_is_exact_transpose() {
        let mut graph = Graph::new("repo");
        for id in ["a.ts", "b.ts", "c.ts"] {
            graph.add_node(file_node(id));
        }
        for (source, target) in [("a.ts", "b.ts"), ("c.ts", "b.ts")] {
            graph
                .upsert_edge(Edge {
                    source: source.to_string(),
                    target: target.to_string(),
                    kind: EdgeKind::Dependency,
                    strength: 1.0,
                })
                .unwrap();
        }
        graph.recompute_adjacency();

        let b = graph.node("b.ts").unwrap();
        assert_eq!(
            b.dependents.iter().cloned().collect::<Vec<_>>(),
            vec!["a.ts".to_string(), "c.ts".to_string()]
        );
        assert!(b.dependencies.is_empty());
        assert!(graph.node("a.ts").unwrap().dependents.is_empty());
    }

    #[test]
    fn set_fixed_roundtrip() {
        let mut graph = Graph::new("repo");
        graph.add_node(file_node("a.ts"));

        graph.set_fixed("a.ts", true).unwrap();
        assert!(graph.node("a.ts").unwrap().fixed);
        graph.set_fixed("a.ts", false).unwrap();
        assert!(!graph.node("a.ts").unwrap().fixed);
        assert!(graph.set_fixed("missing.ts", true).is_err());
    }

    #[test]
    fn graph_serializes_edges_as_list() {
        let mut graph = Graph::new("repo");
        graph.add_node(file_node("a.ts"));
        graph.add_node(file_node("b.ts"));
        graph
            .upsert_edge(Edge {
                source: "a.ts".to_string(),
                target: "b.ts".to_string(),
                kind: EdgeKind::Dependency,
                strength: 1.0,
            })
            .unwrap();

        let raw = serde_json::to_value(&graph).unwrap();
        assert_eq!(raw["edges"][0]["source"], "a.ts");
        assert_eq!(raw["edges"][0]["kind"], "dependency");

        let back: Graph = serde_json::from_value(raw).unwrap();
        assert_eq!(back.edge_count(), 1);
        assert_eq!(back.node_count(), 2);
    }

    #[test]
    fn apply_positions_ignores_unknown_ids() {
        let mut graph = Graph::new("repo");
        graph.add_node(file_node("a.ts"));

        let mut positions = BTreeMap::new();
        positions.insert("a.ts".to_string(), [1.0, 2.0, 3.0]);
        positions.insert("gone.ts".to_string(), [9.0, 9.0, 9.0]);
        graph.apply_positions(&positions);

        assert_eq!(graph.node("a.ts").unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    }
}
