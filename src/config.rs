use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TilevecConfig {
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of items per shard. Affects I/O granularity only, not
    /// embedding correctness.
    pub shard_size: usize,
    /// File extension of the input tiles, without the leading dot.
    pub image_extension: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub input_dir: String,
    pub output_dir: String,
    /// Two-column `id,label` CSV. `None` means every record's label is null.
    pub labels_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    /// Spatial input size expected by the encoder (square).
    pub image_size: u32,
}

impl Default for TilevecConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shard_size: 1000,
            image_extension: "tif".into(),
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_dir: "tiles".into(),
            output_dir: "embeddings".into(),
            labels_path: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_tilevec_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "dinov2-small".into(),
            cache_dir,
            image_size: 224,
        }
    }
}

/// Returns `~/.tilevec/`
pub fn default_tilevec_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".tilevec")
}

/// Returns the default config file path: `~/.tilevec/config.toml`
pub fn default_config_path() -> PathBuf {
    default_tilevec_dir().join("config.toml")
}

impl TilevecConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TilevecConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides (TILEVEC_INPUT, TILEVEC_OUTPUT,
    /// TILEVEC_LABELS, TILEVEC_SHARD_SIZE, TILEVEC_LOG_LEVEL).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TILEVEC_INPUT") {
            self.storage.input_dir = val;
        }
        if let Ok(val) = std::env::var("TILEVEC_OUTPUT") {
            self.storage.output_dir = val;
        }
        if let Ok(val) = std::env::var("TILEVEC_LABELS") {
            self.storage.labels_path = Some(val);
        }
        if let Ok(val) = std::env::var("TILEVEC_SHARD_SIZE") {
            let size: usize = val
                .parse()
                .context("TILEVEC_SHARD_SIZE must be a positive integer")?;
            anyhow::ensure!(size > 0, "TILEVEC_SHARD_SIZE must be greater than zero");
            self.pipeline.shard_size = size;
        }
        if let Ok(val) = std::env::var("TILEVEC_LOG_LEVEL") {
            self.pipeline.log_level = val;
        }
        Ok(())
    }

    /// Resolve the input directory, expanding `~` if needed.
    pub fn resolved_input_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.input_dir)
    }

    /// Resolve the output directory, expanding `~` if needed.
    pub fn resolved_output_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.output_dir)
    }

    /// Resolve the labels path, if one is configured.
    pub fn resolved_labels_path(&self) -> Option<PathBuf> {
        self.storage.labels_path.as_deref().map(expand_tilde)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
