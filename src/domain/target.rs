//! Target definition - a geographic site to analyze.

use crate::id::target_key;
use serde::{Deserialize, Serialize};

/// A geographic site to analyze, immutable once read from input.
///
/// Identity is the (latitude, longitude, country) tuple normalized to a
/// stable key string; the registry dedupes on that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
}

impl Target {
    /// Create a new target.
    pub fn new(latitude: f64, longitude: f64, country: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            country: country.into(),
        }
    }

    /// Stable identity key used for registry dedupe and artifact paths.
    pub fn key(&self) -> String {
        target_key(self.latitude, self.longitude, &self.country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_key() {
        let target = Target::new(10.0, 20.0, "X");
        assert_eq!(target.key(), "10_20_X");
    }

    #[test]
    fn test_same_tuple_same_key() {
        let a = Target::new(48.85, 2.35, "France");
        let b = Target::new(48.85, 2.35, "France");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_different_country_different_key() {
        let a = Target::new(1.0, 2.0, "A");
        let b = Target::new(1.0, 2.0, "B");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_target_deserializes_from_csv_style_fields() {
        let json = r#"{"latitude": 10.0, "longitude": 20.0, "country": "X"}"#;
        let target: Target = serde_json::from_str(json).unwrap();
        assert_eq!(target.country, "X");
    }
}
