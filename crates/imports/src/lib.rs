//! # Atlas Imports
//!
//! Lexical import analysis for the repo-atlas dependency graph.
//!
//! Two pieces:
//!
//! - [`ImportExtractor`] - scans raw source text for `import ... from`,
//!   `export ... from` and `require(...)` statements and yields the raw
//!   relative path strings.
//! - [`PathResolver`] - turns a raw relative import plus its importing
//!   file into a canonical repository-relative path.
//!
//! This is deliberately a best-effort lexical pass, not a parser: path
//! aliases, dynamic imports and template-built paths are missed, and no
//! syntax validation happens. Files the scan cannot make sense of simply
//! yield nothing.

mod error;
mod extractor;
mod resolver;

pub use error::{ImportError, Result};
pub use extractor::ImportExtractor;
pub use resolver::{PathResolver, EXTENSION_PREFERENCE};
