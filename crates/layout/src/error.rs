use thiserror::Error;

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors that can occur during layout simulation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Numeric instability produced a non-finite position or velocity.
    /// Fatal for the run: continuing would propagate NaNs into every
    /// downstream frame.
    #[error("simulation diverged at node '{node}' on iteration {iteration}")]
    SimulationDiverged { node: String, iteration: u64 },

    /// Configuration failed validation
    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),

    /// The worker task is gone (channel closed)
    #[error("layout worker is no longer running")]
    WorkerClosed,
}
