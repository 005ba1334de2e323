//! # Atlas Graph
//!
//! The repository dependency graph: nodes are files and folders keyed by
//! repository-relative path, edges are inferred import dependencies plus
//! structural folder hierarchy.
//!
//! ## Architecture
//!
//! ```text
//! FileRecord[]
//!     │
//!     ├──> Graph Builder
//!     │      ├─ File nodes + derived folder nodes
//!     │      ├─ Parent-child edges (path structure)
//!     │      ├─ Dependency edges (extract -> resolve -> filter)
//!     │      └─ Full adjacency recompute (transpose)
//!     │
//!     ├──> Graph (single mutable aggregate)
//!     │      ├─ Nodes: path-keyed, heat + simulation state in place
//!     │      └─ Edges: (source, target)-keyed, last write wins
//!     │
//!     └──> Graph Index (petgraph)
//!            └─ Depth-bounded neighborhood queries for focus views
//! ```
//!
//! The graph is built once per ingestion and discarded on the next; the
//! heat scorer and layout engine mutate node fields in place and no
//! component keeps a private copy.

mod builder;
mod error;
mod query;
mod types;

pub use builder::GraphBuilder;
pub use error::{GraphError, Result};
pub use query::GraphIndex;
pub use types::{Edge, EdgeKind, Graph, GraphStats, Node, NodeKind};
