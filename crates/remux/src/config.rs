use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a batch remux run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemuxConfig {
    /// Directory containing the .ts recordings to convert
    pub source_dir: PathBuf,
    /// Name of the output folder, created next to the source directory
    pub output_folder_name: String,
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl RemuxConfig {
    /// Create a default configuration with sensible values
    pub fn default_config() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_folder_name: "Converted_Videos_MP4".to_string(),
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

                // Try JSON first, then TOML
                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    let file_config: RemuxConfig = toml::from_str(&content)
                        .with_context(|| format!("Failed to parse TOML config: {}", config_path.display()))?;
                    config = file_config;
                } else {
                    let file_config: RemuxConfig = serde_json::from_str(&content)
                        .with_context(|| format!("Failed to parse JSON config: {}", config_path.display()))?;
                    config = file_config;
                }
            }
        }

        Ok(config)
    }

    /// Output directory: a sibling of the source directory named after
    /// `output_folder_name`. At a filesystem root the source directory
    /// itself is used as the anchor.
    pub fn output_dir(&self) -> PathBuf {
        self.source_dir
            .parent()
            .unwrap_or(&self.source_dir)
            .join(&self.output_folder_name)
    }
}
