//! Target ingestion from CSV input files.
//!
//! Input files carry one candidate site per row with `latitude`,
//! `longitude`, and `country` columns. Extra columns are ignored so the
//! same files can carry annotation fields for other tools.

use std::path::Path;

use serde::Deserialize;

use crate::domain::Target;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct TargetRow {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

impl From<TargetRow> for Target {
    fn from(row: TargetRow) -> Self {
        let country = row
            .country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        Target::new(row.latitude, row.longitude, country)
    }
}

/// Load targets from a CSV file, taking at most `limit` rows when given.
///
/// A row with an unparsable coordinate fails the whole load: a batch built
/// from a half-read input file would silently drop sites.
pub fn load_targets(path: &Path, limit: Option<usize>) -> Result<Vec<Target>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut targets = Vec::new();

    for row in reader.deserialize::<TargetRow>() {
        if let Some(limit) = limit
            && targets.len() >= limit
        {
            break;
        }
        targets.push(row?.into());
    }

    log::info!("loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}
