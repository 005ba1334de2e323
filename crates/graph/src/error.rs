use atlas_imports::ImportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// An import walked above the repository root. Surfaced rather than
    /// dropped: clamping or skipping would corrupt graph topology.
    #[error(transparent)]
    InvalidPath(#[from] ImportError),
}
