//! Durable run registry.
//!
//! The registry is the sole idempotence mechanism for batch resumption: a
//! target whose identity is already present is never reprocessed. Records are
//! append-only; nothing ever rewrites or deletes a persisted run.

pub mod jsonl;
pub mod wire;

use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::RunRecord;
use crate::error::{ArgusError, Result};

pub use jsonl::JsonlRegistry;

/// Durable, identity-deduplicated store of run records.
pub trait RunRegistry: Send + Sync {
    /// Identity keys of all persisted runs.
    fn identities(&self) -> Result<HashSet<String>>;

    /// Append one record. Must be durable, crash-safe, and safe under
    /// concurrent calls. Rejects a duplicate identity.
    fn append(&self, record: &RunRecord) -> Result<()>;

    /// All persisted records in append order.
    fn load_all(&self) -> Result<Vec<RunRecord>>;
}

/// In-memory registry for exercising orchestration logic without a
/// filesystem.
#[derive(Default)]
pub struct MemoryRegistry {
    records: Mutex<Vec<RunRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunRegistry for MemoryRegistry {
    fn identities(&self) -> Result<HashSet<String>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().map(RunRecord::key).collect())
    }

    fn append(&self, record: &RunRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.key() == record.key()) {
            return Err(ArgusError::Persistence(format!(
                "duplicate run identity: {}",
                record.key()
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RunRecord>> {
        Ok(self.records.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RunStatus, Target};

    fn record(country: &str) -> RunRecord {
        let mut record = RunRecord::begin(Target::new(1.0, 2.0, country));
        record.seal(RunStatus::Finished);
        record
    }

    #[test]
    fn test_memory_registry_roundtrip() {
        let registry = MemoryRegistry::new();
        registry.append(&record("A")).unwrap();
        registry.append(&record("B")).unwrap();

        let all = registry.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].target.country, "A");

        let identities = registry.identities().unwrap();
        assert!(identities.contains("1_2_A"));
        assert!(identities.contains("1_2_B"));
    }

    #[test]
    fn test_memory_registry_rejects_duplicate_identity() {
        let registry = MemoryRegistry::new();
        registry.append(&record("A")).unwrap();
        let err = registry.append(&record("A")).unwrap_err();
        assert!(matches!(err, ArgusError::Persistence(_)));
        assert_eq!(registry.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = MemoryRegistry::new();
        assert!(registry.identities().unwrap().is_empty());
        assert!(registry.load_all().unwrap().is_empty());
    }
}
