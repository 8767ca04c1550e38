//! Wire layout for persisted run records.
//!
//! Each record is one JSON object: a `base_info` block with the target
//! identity fields, one `"Analyst N"` entry per step in order, a final
//! `"Commander"` entry once a verdict exists, plus status and timestamps.
//! This is the same shape the map dashboard reads.

use serde_json::{Map, Value, json};

use crate::domain::{RunRecord, RunStatus, StepResult, Target, Verdict};
use crate::error::{ArgusError, Result};
use crate::id::analyst_label;

/// Serialize a run record into its wire object.
pub fn to_wire(record: &RunRecord) -> Result<Value> {
    let mut object = Map::new();

    object.insert(
        "base_info".to_string(),
        json!({
            "latitude": record.target.latitude,
            "longitude": record.target.longitude,
            "country": record.target.country,
        }),
    );
    object.insert("status".to_string(), serde_json::to_value(record.status)?);
    object.insert("started_at".to_string(), json!(record.started_at));
    object.insert("completed_at".to_string(), json!(record.completed_at));

    for (i, step) in record.steps.iter().enumerate() {
        object.insert(analyst_label(i), serde_json::to_value(step)?);
    }

    if let Some(verdict) = &record.verdict {
        object.insert("Commander".to_string(), serde_json::to_value(verdict)?);
    }

    Ok(Value::Object(object))
}

/// Parse a wire object back into a run record.
///
/// A structurally wrong object is a `Persistence` error: a corrupted store
/// fails loudly instead of silently discarding data.
pub fn from_wire(value: &Value) -> Result<RunRecord> {
    let object = value
        .as_object()
        .ok_or_else(|| corrupt("record is not an object"))?;

    let base_info = object
        .get("base_info")
        .ok_or_else(|| corrupt("record missing base_info"))?;
    let target: Target = serde_json::from_value(base_info.clone())
        .map_err(|e| corrupt(&format!("bad base_info: {}", e)))?;

    let status: RunStatus = object
        .get("status")
        .ok_or_else(|| corrupt("record missing status"))
        .and_then(|s| {
            serde_json::from_value(s.clone()).map_err(|e| corrupt(&format!("bad status: {}", e)))
        })?;

    let started_at = object
        .get("started_at")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let completed_at = object.get("completed_at").and_then(Value::as_i64);

    // Analyst entries are keyed "Analyst N"; collect in step order.
    let mut steps: Vec<(usize, StepResult)> = Vec::new();
    for (key, entry) in object {
        if let Some(n) = key.strip_prefix("Analyst ") {
            let index: usize = n
                .parse()
                .map_err(|_| corrupt(&format!("bad analyst label: {}", key)))?;
            let step: StepResult = serde_json::from_value(entry.clone())
                .map_err(|e| corrupt(&format!("bad step for {}: {}", key, e)))?;
            steps.push((index, step));
        }
    }
    steps.sort_by_key(|(index, _)| *index);

    let verdict: Option<Verdict> = object
        .get("Commander")
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(|e| corrupt(&format!("bad verdict: {}", e)))?;

    Ok(RunRecord {
        target,
        steps: steps.into_iter().map(|(_, step)| step).collect(),
        verdict,
        status,
        started_at,
        completed_at,
    })
}

fn corrupt(detail: &str) -> ArgusError {
    ArgusError::Persistence(format!("corrupted registry record: {}", detail))
}
