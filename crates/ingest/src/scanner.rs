use crate::config::ScannerConfig;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Scanner for finding analyzable source files under a repository root.
///
/// Respects `.gitignore` (and global/exclude files), skips hidden files,
/// well-known build/dependency scopes, oversized files and anything
/// outside the supported extension set.
pub struct FileScanner {
    root: PathBuf,
    config: ScannerConfig,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, config: ScannerConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    /// Scan the root for source files (.gitignore aware).
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > self.config.max_file_size_bytes {
                            log::debug!(
                                "skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                self.config.max_file_size_bytes
                            );
                            continue;
                        }
                    }

                    if !is_source_file(path) {
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("found {} source files", files.len());
        files
    }
}

/// Check if the file carries a supported source extension
fn is_source_file(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        let ext = ext.to_lowercase();
        return SUPPORTED_EXTENSIONS
            .iter()
            .any(|candidate| candidate == &ext);
    }
    false
}

pub(crate) fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    if let Ok(relative) = path.strip_prefix(root) {
        for component in relative.components() {
            if let std::path::Component::Normal(name) = component {
                let lowered = name.to_string_lossy().to_lowercase();
                if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                    return true;
                }
            }
        }
    }
    false
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // caches / builds
    ".cache",
    "node_modules",
    ".next",
    ".turbo",
    "build",
    "dist",
    "out",
    "coverage",
    "target",
    ".venv",
    "__pycache__",
    "tmp",
    // data / vendor
    "vendor",
    "third_party",
    "third-party",
];

/// Extensions the import scanner can make sense of, plus the asset kinds
/// worth showing as graph nodes.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Analyzed for imports
    "ts", "tsx", "js", "jsx", "mjs", "cjs",
    // Present as nodes only
    "css", "scss", "less", "json", "md", "html", "svg",
];
