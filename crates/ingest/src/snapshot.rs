use crate::config::ScannerConfig;
use crate::error::Result;
use crate::scanner::FileScanner;
use atlas_protocol::FileRecord;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read a repository snapshot into the flat record list the pipeline
/// consumes.
///
/// Paths are relativized against `root` and normalized to `/`
/// separators. Unreadable or non-UTF-8 files are skipped with a warning
/// (silent degradation); an unreadable root is an error from the
/// scanner's walk instead. Records come back sorted by path.
pub fn load_snapshot(root: &Path, config: &ScannerConfig) -> Result<Vec<FileRecord>> {
    let scanner = FileScanner::new(root, config.clone());
    let mut records = Vec::new();

    for path in scanner.scan() {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let id = normalize_path(relative);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("skipping unreadable file {}: {err}", path.display());
                continue;
            }
        };

        let (size, last_modified) = match std::fs::metadata(&path) {
            Ok(meta) => (meta.len(), modified_unix_seconds(&meta)),
            Err(err) => {
                log::warn!("skipping file without metadata {}: {err}", path.display());
                continue;
            }
        };

        records.push(FileRecord {
            path: id,
            content,
            size,
            last_modified,
        });
    }

    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn modified_unix_seconds(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .and_then(|duration| i64::try_from(duration.as_secs()).ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_records_with_normalized_relative_paths() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("src").join("components");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Header.tsx"), "export const Header = 1;").unwrap();
        fs::write(temp.path().join("index.ts"), "import './src/components/Header';").unwrap();

        let records = load_snapshot(temp.path(), &ScannerConfig::default()).unwrap();

        let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["index.ts", "src/components/Header.tsx"]);

        let header = &records[1];
        assert_eq!(header.size, header.content.len() as u64);
        assert!(header.last_modified > 0);
    }

    #[test]
    fn skips_non_utf8_content() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("binaryish.js"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        fs::write(temp.path().join("fine.ts"), "export {}").unwrap();

        let records = load_snapshot(temp.path(), &ScannerConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "fine.ts");
    }
}
