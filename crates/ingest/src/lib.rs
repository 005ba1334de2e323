//! # Atlas Ingest
//!
//! The pipeline driver: turns a repository on disk (or caller-supplied
//! records) into a heat-annotated dependency graph ready for layout.
//!
//! ```text
//! repository root
//!     │
//!     ├──> FileScanner / load_snapshot   (gitignore-aware file records)
//!     ├──> GitHistoryCollector           (batched git log -> commit records)
//!     │
//!     └──> Pipeline::ingest
//!            ├─ GraphBuilder  (nodes + hierarchy + dependency edges)
//!            ├─ aggregate_history + HeatScorer  (per-file heat)
//!            └─ Graph (single mutable aggregate, rebuilt per ingestion)
//! ```
//!
//! [`StreamingIngestor`] adds filesystem watching on top: debounced
//! whole-graph rebuilds broadcast to subscribers. Every rebuild discards
//! the previous graph; nothing is patched incrementally.

mod config;
mod error;
mod history;
mod pipeline;
mod scanner;
mod snapshot;
mod watcher;

pub use config::{AtlasConfig, HeatConfig, HistoryConfig, ScannerConfig};
pub use error::{IngestError, Result};
pub use history::GitHistoryCollector;
pub use pipeline::Pipeline;
pub use scanner::FileScanner;
pub use snapshot::load_snapshot;
pub use watcher::{IngestUpdate, StreamingIngestor, StreamingIngestorConfig};
