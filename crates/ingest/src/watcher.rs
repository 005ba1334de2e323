//! Streaming re-ingestion: watch the repository root and rebuild the
//! whole graph after changes settle, broadcasting each result.
//!
//! Rebuilds are debounced (a burst of filesystem events coalesces into
//! one cycle) with a max-batch-wait bound so a steady trickle of events
//! cannot starve the rebuild forever.

use crate::config::AtlasConfig;
use crate::error::{IngestError, Result};
use crate::pipeline::Pipeline;
use crate::scanner::is_ignored_scope;
use atlas_graph::{Graph, GraphStats};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{broadcast, mpsc};
use tokio::time;

const DEFAULT_REASON: &str = "fs_event";

/// Result of one rebuild cycle, broadcast to all subscribers.
#[derive(Debug, Clone)]
pub struct IngestUpdate {
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    /// The freshly built graph; `None` on failure.
    pub graph: Option<Arc<Graph>>,
    pub stats: Option<GraphStats>,
    pub success: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamingIngestorConfig {
    pub debounce: Duration,
    pub max_batch_wait: Duration,
    pub notify_poll_interval: Duration,
}

impl Default for StreamingIngestorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(750),
            max_batch_wait: Duration::from_secs(3),
            notify_poll_interval: Duration::from_secs(2),
        }
    }
}

enum IngestorCommand {
    Trigger { reason: String },
    Shutdown,
}

/// Handle to the streaming ingestion task.
#[derive(Clone)]
pub struct StreamingIngestor {
    inner: Arc<StreamingIngestorInner>,
}

struct StreamingIngestorInner {
    command_tx: mpsc::Sender<IngestorCommand>,
    update_tx: broadcast::Sender<IngestUpdate>,
    _watcher: std::sync::Mutex<Option<RecommendedWatcher>>,
}

impl StreamingIngestor {
    pub fn start(root: impl AsRef<Path>, config: AtlasConfig) -> Result<Self> {
        Self::start_with(root, config, StreamingIngestorConfig::default())
    }

    pub fn start_with(
        root: impl AsRef<Path>,
        config: AtlasConfig,
        stream_config: StreamingIngestorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let root = root.as_ref().to_path_buf();

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (update_tx, _) = broadcast::channel(8);

        let watcher = create_fs_watcher(&root, event_tx, stream_config.notify_poll_interval)?;

        spawn_ingest_loop(
            root,
            config,
            stream_config,
            event_rx,
            command_rx,
            update_tx.clone(),
        );

        Ok(Self {
            inner: Arc::new(StreamingIngestorInner {
                command_tx,
                update_tx,
                _watcher: std::sync::Mutex::new(Some(watcher)),
            }),
        })
    }

    /// Force a rebuild regardless of filesystem activity.
    pub async fn trigger(&self, reason: impl Into<String>) -> Result<()> {
        self.inner
            .command_tx
            .send(IngestorCommand::Trigger {
                reason: reason.into(),
            })
            .await
            .map_err(|e| IngestError::Other(format!("failed to send trigger: {e}")))?;
        Ok(())
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IngestUpdate> {
        self.inner.update_tx.subscribe()
    }
}

impl Drop for StreamingIngestor {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(IngestorCommand::Shutdown);
        }
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )
    .map_err(|e| IngestError::Other(format!("watcher init failed: {e}")))?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| IngestError::Other(format!("failed to watch {}: {e}", root.display())))?;
    Ok(watcher)
}

fn spawn_ingest_loop(
    root: PathBuf,
    config: AtlasConfig,
    stream_config: StreamingIngestorConfig,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<IngestorCommand>,
    update_tx: broadcast::Sender<IngestUpdate>,
) {
    tokio::spawn(async move {
        let pipeline = Pipeline::new(config);
        let mut state = DebounceState::new(stream_config.debounce, stream_config.max_batch_wait);

        loop {
            let next_deadline = state.next_deadline();

            tokio::select! {
                Some(event) = event_rx.recv() => {
                    if is_relevant_event(&root, event) {
                        state.record_event(DEFAULT_REASON);
                    }
                }
                Some(cmd) = command_rx.recv() => {
                    match cmd {
                        IngestorCommand::Trigger { reason } => state.force_run(reason),
                        IngestorCommand::Shutdown => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if state.should_run() && next_deadline.is_some() => {
                    let reason = state
                        .take_reason()
                        .unwrap_or_else(|| DEFAULT_REASON.to_string());
                    let update = run_ingest_cycle(&pipeline, &root, reason).await;
                    if !update.success {
                        log::error!("streaming ingest failed: {}", update.reason);
                    }
                    let _ = update_tx.send(update);
                    state.reset();
                }
            }
        }
    });
}

async fn run_ingest_cycle(pipeline: &Pipeline, root: &Path, reason: String) -> IngestUpdate {
    let started = Instant::now();
    let task_pipeline = pipeline.clone();
    let task_root = root.to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || task_pipeline.ingest_path(&task_root)).await;

    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(graph)) => {
            log::info!("rebuild finished in {duration_ms}ms ({reason})");
            IngestUpdate {
                completed_at: SystemTime::now(),
                duration_ms,
                stats: Some(graph.stats()),
                graph: Some(Arc::new(graph)),
                success: true,
                reason,
            }
        }
        Ok(Err(err)) => IngestUpdate {
            completed_at: SystemTime::now(),
            duration_ms,
            graph: None,
            stats: None,
            success: false,
            reason: format!("{reason}: {err}"),
        },
        Err(err) => IngestUpdate {
            completed_at: SystemTime::now(),
            duration_ms,
            graph: None,
            stats: None,
            success: false,
            reason: format!("{reason}: ingest task panicked: {err}"),
        },
    }
}

fn is_relevant_event(root: &Path, event: notify::Result<Event>) -> bool {
    match event {
        Ok(event) => {
            if event.paths.is_empty() {
                return true;
            }
            event
                .paths
                .iter()
                .any(|path| !is_ignored_scope(path, root))
        }
        Err(err) => {
            log::warn!("watcher error: {err}");
            false
        }
    }
}

struct DebounceState {
    debounce: Duration,
    max_batch: Duration,
    dirty: bool,
    last_event: Option<Instant>,
    first_event: Option<Instant>,
    reason: Option<String>,
    force_immediate: bool,
}

impl DebounceState {
    fn new(debounce: Duration, max_batch: Duration) -> Self {
        Self {
            debounce,
            max_batch,
            dirty: false,
            last_event: None,
            first_event: None,
            reason: None,
            force_immediate: false,
        }
    }

    fn record_event(&mut self, reason: &str) {
        self.reason = Some(reason.to_string());
        self.last_event = Some(Instant::now());
        self.first_event.get_or_insert_with(Instant::now);
        self.dirty = true;
    }

    fn force_run(&mut self, reason: String) {
        self.reason = Some(reason);
        self.force_immediate = true;
        self.dirty = true;
    }

    const fn should_run(&self) -> bool {
        self.dirty
    }

    fn next_deadline(&self) -> Option<time::Instant> {
        if !self.dirty {
            return None;
        }
        if self.force_immediate {
            return Some(time::Instant::now());
        }

        let mut deadline = self.last_event.map(|last| last + self.debounce);
        if let Some(first) = self.first_event {
            let forced = first + self.max_batch;
            deadline = Some(match deadline {
                Some(current) if forced < current => forced,
                Some(current) => current,
                None => forced,
            });
        }
        deadline.map(time::Instant::from_std)
    }

    fn take_reason(&mut self) -> Option<String> {
        self.reason.take()
    }

    fn reset(&mut self) {
        self.dirty = false;
        self.last_event = None;
        self.first_event = None;
        self.reason = None;
        self.force_immediate = false;
    }
}
