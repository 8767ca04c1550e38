//! Identity and capture-key utilities for Argus
//!
//! Target identity keys and per-step capture identifiers are deterministic so
//! that re-running a step addresses the same artifact and the registry can
//! dedupe on a stable string.

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Stable identity key for a target.
///
/// Format: `{latitude}_{longitude}_{country}`
/// Example: `10.5_20.25_X`
pub fn target_key(latitude: f64, longitude: f64, country: &str) -> String {
    format!("{}_{}_{}", latitude, longitude, country)
}

/// Capture identifier for one step of a run.
///
/// Format: `{target_key}/analyst_{n}` with `n` 1-based to match the
/// analyst labels used in the persisted record.
pub fn capture_id(target_key: &str, step_index: usize) -> String {
    format!("{}/analyst_{}", target_key, step_index + 1)
}

/// Label for a step's entry in the persisted record.
///
/// Format: `Analyst {n}`, 1-based.
pub fn analyst_label(step_index: usize) -> String {
    format!("Analyst {}", step_index + 1)
}
