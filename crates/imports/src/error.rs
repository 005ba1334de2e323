use thiserror::Error;

/// Result type for import analysis operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that can occur while resolving import paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// A `..` segment walked above the repository root. Clamping here
    /// would silently rewrite graph topology, so this is always an error.
    #[error("import '{import}' from '{importer}' escapes the repository root")]
    PathUnderflow { importer: String, import: String },
}
