//! Configuration types for the node record cleaning pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::schema::ChannelKind;
use crate::core::writers::CLEAN_SUFFIX;

/// What to do with marker-delimited blocks beyond the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraBlocks {
    /// Log a warning and consume only banks A and B
    #[default]
    Ignore,
    /// Fail with a structural error
    Reject,
}

/// How bank A and bank B are reconciled when their row counts differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAlignment {
    /// Keep the shorter length and drop the excess rows of the longer bank
    #[default]
    Truncate,
    /// Fail with a structural error
    Strict,
}

/// Configuration for writing the cleaned table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write `{stem}{suffix}{ext}` next to the input; otherwise hand the
    /// table back to the caller
    #[serde(default = "default_save")]
    pub save: bool,

    /// Suffix appended to the input file stem
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Directory for the cleaned file instead of the input's directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_save() -> bool {
    true
}

fn default_suffix() -> String {
    CLEAN_SUFFIX.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save: default_save(),
            suffix: default_suffix(),
            directory: None,
        }
    }
}

/// Configuration for splitting the file into bank blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockConfig {
    /// A row whose first cell starts with this text begins a new block
    #[serde(default = "default_marker_prefix")]
    pub marker_prefix: String,

    #[serde(default)]
    pub extra_blocks: ExtraBlocks,
}

fn default_marker_prefix() -> String {
    "Time".to_string()
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            marker_prefix: default_marker_prefix(),
            extra_blocks: ExtraBlocks::default(),
        }
    }
}

/// Configuration for merging the two banks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub alignment: BankAlignment,
}

/// Configuration for the stationary-sample filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationaryConfig {
    /// Remove stationary samples (and downsample the time axis)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Keep every n-th row before change detection
    #[serde(default = "default_downsample_factor")]
    pub downsample_factor: usize,

    /// Column of each channel used to detect movement
    #[serde(default = "default_detector")]
    pub detector: ChannelKind,
}

fn default_enabled() -> bool {
    true
}

fn default_downsample_factor() -> usize {
    2
}

fn default_detector() -> ChannelKind {
    ChannelKind::Exp
}

impl Default for StationaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            downsample_factor: default_downsample_factor(),
            detector: default_detector(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub blocks: BlockConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub stationary: StationaryConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Strict mode: reject extra blocks and mismatched bank lengths.
    pub fn strict(mut self) -> Self {
        self.blocks.extra_blocks = ExtraBlocks::Reject;
        self.merge.alignment = BankAlignment::Strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert!(config.output.save);
        assert_eq!(config.output.suffix, "_CLEAN");
        assert!(config.output.directory.is_none());
        assert_eq!(config.blocks.marker_prefix, "Time");
        assert_eq!(config.blocks.extra_blocks, ExtraBlocks::Ignore);
        assert_eq!(config.merge.alignment, BankAlignment::Truncate);
        assert!(config.stationary.enabled);
        assert_eq!(config.stationary.downsample_factor, 2);
        assert_eq!(config.stationary.detector, ChannelKind::Exp);
    }

    #[test]
    fn test_strict_config() {
        let config = PipelineConfig::default().strict();
        assert_eq!(config.blocks.extra_blocks, ExtraBlocks::Reject);
        assert_eq!(config.merge.alignment, BankAlignment::Strict);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "stationary:\n  enabled: false\nmerge:\n  alignment: strict\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.stationary.enabled);
        assert_eq!(config.stationary.downsample_factor, 2);
        assert_eq!(config.merge.alignment, BankAlignment::Strict);
        assert!(config.output.save);
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PipelineConfig::default();
        config.stationary.detector = ChannelKind::Prim;
        config.output.suffix = "_TRIMMED".to_string();
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.stationary.detector, ChannelKind::Prim);
        assert_eq!(loaded.output.suffix, "_TRIMMED");
    }
}
