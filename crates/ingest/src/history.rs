use crate::config::HistoryConfig;
use crate::error::Result;
use atlas_protocol::CommitRecord;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Collects per-file commit history from a local git repository.
///
/// One batched `git log` invocation for the whole snapshot rather than a
/// subprocess per file; parsing its `--name-only` output incrementally
/// associates each commit with the files it touched. Non-git directories
/// (or a missing git binary) degrade to empty history, which downstream
/// becomes heat 0 - never an error.
#[derive(Debug, Clone)]
pub struct GitHistoryCollector {
    config: HistoryConfig,
}

impl GitHistoryCollector {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self { config }
    }

    /// Run the batched log and return path -> commit records.
    ///
    /// Output format requested from git:
    ///
    /// ```text
    /// 1712345678|alice@example.com|Fix crash on startup
    /// src/app.ts
    /// src/util.ts
    ///
    /// 1712000000|bob@example.com|Add settings page
    /// src/settings.ts
    /// ```
    pub fn collect(&self, root: &Path) -> Result<BTreeMap<String, Vec<CommitRecord>>> {
        let output = Command::new("git")
            .arg("log")
            .arg("--format=%at|%ae|%s")
            .arg("--name-only")
            .arg("-n")
            .arg(self.config.max_commits.to_string())
            .current_dir(root)
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                log::debug!("git unavailable, continuing without history: {err}");
                return Ok(BTreeMap::new());
            }
        };

        if !output.status.success() {
            log::debug!(
                "git log failed in {}, continuing without history",
                root.display()
            );
            return Ok(BTreeMap::new());
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse_log(&text))
    }
}

/// Parse `git log --format=%at|%ae|%s --name-only` output.
///
/// Header lines are `timestamp|author|subject`; following non-empty
/// lines are the touched file paths; a blank line separates commits.
fn parse_log(text: &str) -> BTreeMap<String, Vec<CommitRecord>> {
    let mut history: BTreeMap<String, Vec<CommitRecord>> = BTreeMap::new();
    let mut current: Option<CommitRecord> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            current = None;
            continue;
        }

        if let Some(record) = parse_header(line) {
            if record.message.is_empty() || record.author.is_empty() {
                log::debug!("skipping commit with empty subject or author");
                current = None;
            } else {
                current = Some(record);
            }
            continue;
        }

        if let Some(record) = &current {
            history
                .entry(line.to_string())
                .or_default()
                .push(record.clone());
        }
    }

    history
}

fn parse_header(line: &str) -> Option<CommitRecord> {
    let (timestamp, rest) = line.split_once('|')?;
    let timestamp: i64 = timestamp.parse().ok()?;
    let (author, message) = rest.split_once('|')?;
    Some(CommitRecord {
        message: message.to_string(),
        timestamp,
        author: author.to_string(),
    })
}
