//! Imagery capture for target runs.
//!
//! The capture mechanism itself is an external collaborator; this module owns
//! its interface, the bounded session pool that models exclusive capture
//! sessions, and an HTTP snapshot client.

pub mod tiles;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::ViewportState;
use crate::error::{ArgusError, Result};

pub use tiles::{TileClient, TileConfig};

/// Capture capability: image bytes for a viewport, addressed by a
/// deterministic identifier so repeated captures of the same step overwrite
/// but never corrupt.
#[async_trait]
pub trait ImagingService: Send + Sync {
    async fn capture(&self, view: &ViewportState, identifier: &str) -> Result<Vec<u8>>;
}

/// Wraps an imaging service in a pool of N exclusive sessions.
///
/// A permit is held for exactly the duration of one capture and released on
/// every exit path, including failure; the permit guard takes care of that.
pub struct SessionPool<S: ImagingService> {
    inner: Arc<S>,
    permits: Arc<Semaphore>,
}

impl<S: ImagingService> SessionPool<S> {
    /// Create a pool with `sessions` concurrent capture slots.
    pub fn new(inner: Arc<S>, sessions: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(sessions.max(1))),
        }
    }

    /// Number of currently free sessions.
    pub fn available_sessions(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl<S: ImagingService> ImagingService for SessionPool<S> {
    async fn capture(&self, view: &ViewportState, identifier: &str) -> Result<Vec<u8>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ArgusError::Imaging("capture session pool closed".to_string()))?;
        self.inner.capture(view, identifier).await
    }
}
