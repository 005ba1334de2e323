use crate::error::Result;
use crate::types::{Edge, EdgeKind, Graph, Node};
use atlas_imports::{ImportExtractor, PathResolver};
use atlas_protocol::FileRecord;
use std::collections::BTreeSet;

const DEPENDENCY_STRENGTH: f64 = 1.0;
const PARENT_CHILD_STRENGTH: f64 = 0.5;

/// Builds the graph aggregate from a repository snapshot.
///
/// Two independent edge derivations: folder hierarchy from path prefixes,
/// and dependency edges from the extract -> resolve pipeline. Candidate
/// dependency edges whose resolved target is not a known node are dropped
/// silently (observable only through [`Graph::stats`]); a resolver
/// underflow (`..` above the root) is the one import condition that
/// propagates as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    extractor: ImportExtractor,
    resolver: PathResolver,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractor: ImportExtractor::new(),
            resolver: PathResolver::new(),
        }
    }

    /// Build a graph from the full file list.
    ///
    /// Deterministic: identical records in any order produce an identical
    /// graph - nodes and edges accumulate into ordered maps and adjacency
    /// is recomputed from final state, so processing order never shows.
    pub fn build(&self, root_path: impl Into<String>, files: &[FileRecord]) -> Result<Graph> {
        let mut graph = Graph::new(root_path);

        // Phase 1: file nodes, plus folder nodes for every ancestor
        // directory seen in the file paths.
        let mut folders: BTreeSet<String> = BTreeSet::new();
        for record in files {
            graph.add_node(Node::file(record));
            folders.extend(ancestor_dirs(&record.path));
        }
        for folder in folders {
            if !graph.contains(&folder) {
                graph.add_node(Node::folder(folder));
            }
        }

        // Phase 2: structural hierarchy edges, independent of imports.
        let ids: Vec<String> = graph.nodes().map(|node| node.id.clone()).collect();
        for id in &ids {
            if let Some(parent) = parent_dir(id) {
                graph.upsert_edge(Edge {
                    source: parent.to_string(),
                    target: id.clone(),
                    kind: EdgeKind::ParentChild,
                    strength: PARENT_CHILD_STRENGTH,
                })?;
            }
        }

        // Phase 3: dependency edges from static import analysis.
        for record in files {
            for raw in self.extractor.extract(&record.content) {
                let target = self.resolver.resolve(&record.path, &raw)?;
                if graph.contains(&target) {
                    graph.upsert_edge(Edge {
                        source: record.path.clone(),
                        target,
                        kind: EdgeKind::Dependency,
                        strength: DEPENDENCY_STRENGTH,
                    })?;
                } else {
                    log::debug!(
                        "dropping import '{raw}' from {}: no node at {target}",
                        record.path
                    );
                }
            }
        }

        graph.recompute_adjacency();
        log::info!(
            "built graph for {}: {} nodes, {} edges",
            graph.root_path,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

/// Every ancestor directory of a path: `src/a/b.ts` -> `src`, `src/a`.
fn ancestor_dirs(path: &str) -> Vec<String> {
    path.match_indices('/')
        .filter(|(idx, _)| *idx > 0)
        .map(|(idx, _)| path[..idx].to_string())
        .collect()
}

fn parent_dir(id: &str) -> Option<&str> {
    id.rsplit_once('/').map(|(dir, _)| dir).filter(|dir| !dir.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use atlas_imports::ImportError;
    use crate::error::GraphError;
    use pretty_assertions::assert_eq;

    fn record(path: &str, content: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            content: content.to_string(),
            size: content.len() as u64,
            last_modified: 1_700_000_000,
        }
    }

    #[test]
    fn single_import_produces_one_edge_and_exact_adjacency() {
        let files = vec![
            record("a.ts", "import { b } from './b';"),
            record("b.ts", "export const b = 1;"),
        ];
        let graph = GraphBuilder::new().build("repo", &files).unwrap();

        let deps: Vec<&Edge> = graph
            .edges()
            .filter(|edge| edge.kind == EdgeKind::Dependency)
            .collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].source, "a.ts");
        assert_eq!(deps[0].target, "b.ts");

        assert_eq!(
            graph.node("b.ts").unwrap().dependents.iter().cloned().collect::<Vec<_>>(),
            vec!["a.ts".to_string()]
        );
        assert!(graph.node("a.ts").unwrap().dependents.is_empty());
    }

    #[test]
    fn unresolvable_imports_are_dropped_not_errors() {
        let files = vec![record("a.ts", "import { x } from './missing';")];
        let graph = GraphBuilder::new().build("repo", &files).unwrap();

        assert_eq!(graph.stats().dependency_edges, 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn no_dangling_edges_survive_the_build() {
        let files = vec![
            record(
                "src/app.ts",
                "import './real';\nimport './fake';\nimport '../escape-candidate';",
            ),
            record("src/real.ts", ""),
            record("escape-candidate.ts", ""),
        ];
        let graph = GraphBuilder::new().build("repo", &files).unwrap();

        for edge in graph.edges() {
            assert!(graph.contains(&edge.source));
            assert!(graph.contains(&edge.target));
        }
        assert_eq!(graph.stats().dependency_edges, 2);
    }

    #[test]
    fn underflow_surfaces_as_an_error() {
        let files = vec![record("a.ts", "import { x } from '../../outside';")];
        let err = GraphBuilder::new().build("repo", &files).unwrap_err();
        assert!(matches!(err, GraphError::InvalidPath(ImportError::PathUnderflow { .. })));
    }

    #[test]
    fn folder_hierarchy_is_derived_from_path_prefixes() {
        let files = vec![
            record("src/components/Header.tsx", ""),
            record("src/index.ts", ""),
        ];
        let graph = GraphBuilder::new().build("repo", &files).unwrap();

        assert_eq!(graph.node("src").unwrap().kind, NodeKind::Folder);
        assert_eq!(graph.node("src/components").unwrap().kind, NodeKind::Folder);

        let hierarchy: Vec<(String, String)> = graph
            .edges()
            .filter(|edge| edge.kind == EdgeKind::ParentChild)
            .map(|edge| (edge.source.clone(), edge.target.clone()))
            .collect();
        assert_eq!(
            hierarchy,
            vec![
                ("src".to_string(), "src/components".to_string()),
                ("src".to_string(), "src/index.ts".to_string()),
                ("src/components".to_string(), "src/components/Header.tsx".to_string()),
            ]
        );
    }

    #[test]
    fn duplicate_imports_collapse_to_one_edge() {
        let files = vec![
            record("a.ts", "import { x } from './b';\nimport { y } from './b';"),
            record("b.ts", ""),
        ];
        let graph = GraphBuilder::new().build("repo", &files).unwrap();
        assert_eq!(graph.stats().dependency_edges, 1);
    }

    #[test]
    fn build_is_order_independent() {
        let forward = vec![
            record("src/a.ts", "import './b';\nimport '../lib/util';"),
            record("src/b.ts", "import '../lib/util';"),
            record("lib/util.ts", ""),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let builder = GraphBuilder::new();
        let first = builder.build("repo", &forward).unwrap();
        let second = builder.build("repo", &reversed).unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn extension_inference_follows_preference_order() {
        // helpers.ts exists under the inferred name, jsx sibling does not
        // get picked: the first preference always wins.
        let files = vec![
            record("src/components/Header.tsx", "import '../utils/helpers';"),
            record("src/utils/helpers.ts", ""),
            record("src/utils/helpers.jsx", ""),
        ];
        let graph = GraphBuilder::new().build("repo", &files).unwrap();

        let deps: Vec<&Edge> = graph
            .edges()
            .filter(|edge| edge.kind == EdgeKind::Dependency)
            .collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].target, "src/utils/helpers.ts");
    }
}
