use crate::config::AtlasConfig;
use crate::error::Result;
use crate::history::GitHistoryCollector;
use crate::snapshot::load_snapshot;
use anyhow::Context;
use atlas_graph::{Graph, GraphBuilder, NodeKind};
use atlas_heat::{aggregate_history, HeatScorer};
use atlas_protocol::{CommitRecord, FileRecord};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// The ingestion driver.
///
/// Owns the single mutable graph aggregate for the duration of a build:
/// the builder constructs it, then heat is written into the file nodes
/// in place. Every call produces a fresh graph; nothing is patched.
#[derive(Debug, Clone)]
pub struct Pipeline {
    builder: GraphBuilder,
    scorer: HeatScorer,
    config: AtlasConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            builder: GraphBuilder::new(),
            scorer: HeatScorer::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Build the heat-annotated graph from caller-supplied records.
    ///
    /// `history` maps node id to that file's commit records; files
    /// without history keep the default heat of 0 (silent degradation).
    /// `now` anchors the recency window.
    pub fn ingest(
        &self,
        root_path: &str,
        files: &[FileRecord],
        history: &BTreeMap<String, Vec<CommitRecord>>,
        now: i64,
    ) -> Result<Graph> {
        let mut graph = self.builder.build(root_path, files)?;

        let file_ids: Vec<String> = graph
            .nodes()
            .filter(|node| node.kind == NodeKind::File)
            .map(|node| node.id.clone())
            .collect();

        let mut scored = 0usize;
        for id in file_ids {
            let Some(records) = history.get(&id) else {
                continue;
            };
            let aggregates =
                aggregate_history(records, now, self.config.heat.recent_window_days)?;
            if let Some(node) = graph.node_mut(&id) {
                node.aggregates = aggregates;
                node.heat_score = self.scorer.score(&aggregates);
                scored += 1;
            }
        }

        log::info!(
            "ingested {}: {} nodes, {} edges, {scored} heat-scored",
            root_path,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Convenience entry point: snapshot the directory at `root`, collect
    /// local git history, and ingest.
    pub fn ingest_path(&self, root: &Path) -> anyhow::Result<Graph> {
        let files = load_snapshot(root, &self.config.scanner)
            .with_context(|| format!("failed to snapshot {}", root.display()))?;
        let history = GitHistoryCollector::new(self.config.history.clone())
            .collect(root)
            .with_context(|| format!("failed to collect history for {}", root.display()))?;
        let now = unix_now();
        let root_path = root.to_string_lossy().into_owned();
        Ok(self.ingest(&root_path, &files, &history, now)?)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000;

    fn record(path: &str, content: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            content: content.to_string(),
            size: content.len() as u64,
            last_modified: NOW,
        }
    }

    fn commit(message: &str, days_ago: i64) -> CommitRecord {
        CommitRecord {
            message: message.to_string(),
            timestamp: NOW - days_ago * 86_400,
            author: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn ingest_scores_files_with_history_and_defaults_the_rest() {
        let files = vec![
            record("src/app.ts", "import './util';"),
            record("src/util.ts", ""),
        ];
        let mut history = BTreeMap::new();
        history.insert(
            "src/app.ts".to_string(),
            vec![commit("Fix crash", 1), commit("Add feature", 3)],
        );

        let pipeline = Pipeline::new(AtlasConfig::default());
        let graph = pipeline.ingest("repo", &files, &history, NOW).unwrap();

        let app = graph.node("src/app.ts").unwrap();
        assert_eq!(app.aggregates.commit_count, 2);
        assert_eq!(app.aggregates.bug_fix_count, 1);
        assert!(app.heat_score > 0.0);

        let util = graph.node("src/util.ts").unwrap();
        assert_eq!(util.heat_score, 0.0);
        assert!(util.aggregates.is_empty());

        // Folder nodes never carry heat.
        assert_eq!(graph.node("src").unwrap().heat_score, 0.0);
    }

    #[test]
    fn malformed_history_fails_the_ingest() {
        let files = vec![record("a.ts", "")];
        let mut history = BTreeMap::new();
        history.insert(
            "a.ts".to_string(),
            vec![CommitRecord {
                message: "Fix".to_string(),
                timestamp: -1,
                author: "alice".to_string(),
            }],
        );

        let pipeline = Pipeline::new(AtlasConfig::default());
        assert!(pipeline.ingest("repo", &files, &history, NOW).is_err());
    }

    #[test]
    fn history_for_unknown_paths_is_ignored() {
        let files = vec![record("a.ts", "")];
        let mut history = BTreeMap::new();
        history.insert("deleted.ts".to_string(), vec![commit("Fix", 1)]);

        let pipeline = Pipeline::new(AtlasConfig::default());
        let graph = pipeline.ingest("repo", &files, &history, NOW).unwrap();
        assert_eq!(graph.node("a.ts").unwrap().heat_score, 0.0);
    }
}
