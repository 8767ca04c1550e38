//! HTTP snapshot client for satellite imagery.
//!
//! Fetches a capture from a configured URL template and optionally mirrors
//! the bytes to an artifact directory keyed by the capture identifier, so a
//! step's imagery can be audited after the run.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::ImagingService;
use crate::domain::ViewportState;
use crate::error::{ArgusError, Result};

/// Configuration for the snapshot client.
#[derive(Debug, Clone)]
pub struct TileConfig {
    /// URL template with `{lat}`, `{lon}` and `{alt}` placeholders.
    pub url_template: String,
    pub timeout: Duration,
    /// When set, every capture is also written to
    /// `{artifact_dir}/{identifier}.jpeg`.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            timeout: Duration::from_secs(30),
            artifact_dir: None,
        }
    }
}

/// Imaging service backed by an HTTP snapshot endpoint.
#[derive(Debug)]
pub struct TileClient {
    client: Client,
    config: TileConfig,
}

impl TileClient {
    /// Create a snapshot client.
    pub fn new(config: TileConfig) -> Result<Self> {
        if config.url_template.is_empty() {
            return Err(ArgusError::Config(
                "imaging url_template is not set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArgusError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Expand the URL template for a viewport.
    fn capture_url(&self, view: &ViewportState) -> String {
        self.config
            .url_template
            .replace("{lat}", &view.latitude.to_string())
            .replace("{lon}", &view.longitude.to_string())
            .replace("{alt}", &view.altitude.to_string())
    }

    /// Mirror capture bytes to the artifact directory. Overwrites any earlier
    /// capture with the same identifier, which keeps repeated captures
    /// idempotent.
    fn mirror_artifact(&self, identifier: &str, bytes: &[u8]) -> Result<()> {
        let Some(dir) = &self.config.artifact_dir else {
            return Ok(());
        };
        let path = dir.join(format!("{}.jpeg", identifier));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }
}

#[async_trait]
impl ImagingService for TileClient {
    async fn capture(&self, view: &ViewportState, identifier: &str) -> Result<Vec<u8>> {
        let url = self.capture_url(view);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArgusError::Imaging(format!("capture request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArgusError::Imaging(format!(
                "capture failed with status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArgusError::Imaging(format!("capture body read failed: {}", e)))?
            .to_vec();

        if bytes.is_empty() {
            return Err(ArgusError::Imaging("capture returned no bytes".to_string()));
        }

        self.mirror_artifact(identifier, &bytes)?;
        log::debug!("captured {} bytes for {}", bytes.len(), identifier);
        Ok(bytes)
    }
}
