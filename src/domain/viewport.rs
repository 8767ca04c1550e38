//! Viewport state and the pure transition function.
//!
//! The viewport is the camera position for a run: latitude, longitude and
//! altitude (camera distance in meters). It is mutated only through
//! `transition` and never shared outside one run's executor.

use super::action::Action;
use serde::{Deserialize, Serialize};

/// Minimum camera altitude in meters. Zooming in never goes below this, so a
/// long zoom-in sequence cannot produce a zero or negative camera distance.
pub const MIN_ALTITUDE: f64 = 1.0;

/// Camera position over a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl ViewportState {
    /// Create a viewport centered on the given coordinates.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Apply an action and return the resulting state.
    ///
    /// Pure and total over the five known actions. `Finish` leaves the state
    /// unchanged; the caller terminates the loop.
    pub fn transition(&self, action: Action, zoom_delta: f64, pan_delta: f64) -> ViewportState {
        let mut next = *self;
        match action {
            Action::ZoomIn => next.altitude = (next.altitude - zoom_delta).max(MIN_ALTITUDE),
            Action::ZoomOut => next.altitude += zoom_delta,
            Action::MoveLeft => next.longitude -= pan_delta,
            Action::MoveRight => next.longitude += pan_delta,
            Action::Finish => {}
        }
        next
    }
}
