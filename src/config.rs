use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::executor::ExecutorConfig;
use crate::imaging::TileConfig;
use crate::llm::GeminiConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub imaging: ImagingConfig,
    pub viewport: ViewportConfig,
    pub batch: BatchConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub endpoint: String,
    pub max_output_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: crate::llm::DEFAULT_MODEL.to_string(),
            endpoint: crate::llm::GEMINI_API_URL.to_string(),
            max_output_tokens: crate::llm::DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_ms: 120000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagingConfig {
    /// Capture URL with `{lat}`, `{lon}`, and `{alt}` placeholders. Must be
    /// set before the run command can work.
    pub url_template: String,
    pub timeout_ms: u64,
    pub sessions: usize,
    pub artifact_dir: Option<PathBuf>,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            timeout_ms: 30000,
            sessions: 2,
            artifact_dir: Some(
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("argus")
                    .join("captures"),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub initial_altitude: f64,
    pub zoom_delta: f64,
    pub pan_delta: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            initial_altitude: 20000.0,
            zoom_delta: 5000.0,
            pan_delta: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_steps: u32,
    pub parallel_targets: usize,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub context_entries: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            parallel_targets: 4,
            retry_attempts: 3,
            retry_backoff_ms: 250,
            context_entries: crate::context::DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub registry_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registry_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("argus")
                .join("runs.jsonl"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            imaging: ImagingConfig::default(),
            viewport: ViewportConfig::default(),
            batch: BatchConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            initial_altitude: self.viewport.initial_altitude,
            zoom_delta: self.viewport.zoom_delta,
            pan_delta: self.viewport.pan_delta,
            retry_attempts: self.batch.retry_attempts,
            retry_backoff: Duration::from_millis(self.batch.retry_backoff_ms),
            context_entries: self.batch.context_entries,
        }
    }

    pub fn tile_config(&self) -> TileConfig {
        TileConfig {
            url_template: self.imaging.url_template.clone(),
            timeout: Duration::from_millis(self.imaging.timeout_ms),
            artifact_dir: self.imaging.artifact_dir.clone(),
        }
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.llm.model.clone(),
            endpoint: self.llm.endpoint.clone(),
            max_output_tokens: self.llm.max_output_tokens,
            timeout: Duration::from_millis(self.llm.timeout_ms),
        }
    }
}
