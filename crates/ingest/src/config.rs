use crate::error::{IngestError, Result};
use atlas_layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration bundle, loadable from TOML.
///
/// Every section has shipping defaults, so an empty document (or no
/// config file at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub scanner: ScannerConfig,
    pub history: HistoryConfig,
    pub heat: HeatConfig,
    pub layout: LayoutConfig,
}

impl AtlasConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| IngestError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout
            .validate()
            .map_err(IngestError::InvalidConfig)?;
        if self.scanner.max_file_size_bytes == 0 {
            return Err(IngestError::InvalidConfig(
                "scanner.max_file_size_bytes must be > 0".to_string(),
            ));
        }
        if self.history.max_commits == 0 {
            return Err(IngestError::InvalidConfig(
                "history.max_commits must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot scanning limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Files larger than this are skipped.
    pub max_file_size_bytes: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 1_048_576, // 1 MiB
        }
    }
}

/// Git history collection limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Most recent commits examined by the batched log parse.
    pub max_commits: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_commits: 500 }
    }
}

/// Heat aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Window for the `recent_commits` aggregate.
    pub recent_window_days: u64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            recent_window_days: atlas_heat::RECENT_WINDOW_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AtlasConfig::from_toml_str("").unwrap();
        assert_eq!(config.history.max_commits, 500);
        assert_eq!(config.heat.recent_window_days, 30);
        assert_eq!(config.scanner.max_file_size_bytes, 1_048_576);
    }

    #[test]
    fn sections_override_individually() {
        let config = AtlasConfig::from_toml_str(
            r#"
            [history]
            max_commits = 50

            [layout]
            link_distance = 45.0
            "#,
        )
        .unwrap();
        assert_eq!(config.history.max_commits, 50);
        assert_eq!(config.layout.link_distance, 45.0);
        // Untouched sections keep their defaults.
        assert_eq!(config.layout.tick_stride, 1);
    }

    #[test]
    fn invalid_sections_are_rejected() {
        assert!(AtlasConfig::from_toml_str("[history]\nmax_commits = 0").is_err());
        assert!(AtlasConfig::from_toml_str("[layout]\ndamping = 0.0").is_err());
        assert!(AtlasConfig::from_toml_str("not toml at all [").is_err());
    }
}
