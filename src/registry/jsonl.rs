//! JSONL-backed run registry.
//!
//! One wire object per line, appended atomically enough for our purposes: a
//! crash mid-write can only damage the final line, never a prior record. A
//! truncated final line is treated as a crash remnant and skipped with a
//! warning; a malformed line anywhere else means real corruption and fails
//! loudly.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use super::{RunRegistry, wire};
use crate::domain::RunRecord;
use crate::error::{ArgusError, Result};

/// Append-only JSONL registry with a cached identity set.
pub struct JsonlRegistry {
    path: PathBuf,
    /// Identity cache, loaded lazily. Appends go through this lock, which
    /// also serializes the file writes.
    keys: Mutex<Option<HashSet<String>>>,
}

impl JsonlRegistry {
    /// Open (or create the parent directory for) a registry file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            keys: Mutex::new(None),
        })
    }

    /// Read every record from disk. A missing file is an empty registry.
    fn read_records(&self) -> Result<Vec<RunRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        let last = lines.len().saturating_sub(1);

        let mut records = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(value) => records.push(wire::from_wire(&value)?),
                Err(e) if i == last => {
                    // Only the final line can be a partially-written crash
                    // remnant; anything earlier is corruption.
                    log::warn!(
                        "registry {} has truncated final line, skipping: {}",
                        self.path.display(),
                        e
                    );
                }
                Err(e) => {
                    return Err(ArgusError::Persistence(format!(
                        "corrupted registry {} at line {}: {}",
                        self.path.display(),
                        i + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Drop a partially-written final line left by a crash mid-append.
    ///
    /// Tolerating the remnant at read time is not enough: appending straight
    /// after it would merge the new record into the partial text, and once a
    /// further record follows, that merged line is no longer last and every
    /// load fails. Truncating back to the last complete line keeps the file
    /// readable and loses only the write the crash already lost.
    fn trim_partial_tail(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }

        let mut byte = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut byte)?;
        if byte[0] == b'\n' {
            return Ok(());
        }

        // Walk back to the end of the last complete line
        let mut keep = len - 1;
        while keep > 0 {
            file.seek(SeekFrom::Start(keep - 1))?;
            file.read_exact(&mut byte)?;
            if byte[0] == b'\n' {
                break;
            }
            keep -= 1;
        }

        log::warn!(
            "registry {} dropping {} byte partial tail before append",
            self.path.display(),
            len - keep
        );
        file.set_len(keep)?;
        Ok(())
    }

    /// Load the identity cache if it isn't yet, returning a locked guard.
    fn ensure_keys(&self) -> Result<std::sync::MutexGuard<'_, Option<HashSet<String>>>> {
        let mut guard = self
            .keys
            .lock()
            .map_err(|e| ArgusError::Persistence(e.to_string()))?;
        if guard.is_none() {
            let keys = self
                .read_records()?
                .iter()
                .map(RunRecord::key)
                .collect::<HashSet<_>>();
            *guard = Some(keys);
        }
        Ok(guard)
    }
}

impl RunRegistry for JsonlRegistry {
    fn identities(&self) -> Result<HashSet<String>> {
        let guard = self.ensure_keys()?;
        Ok(guard.as_ref().cloned().unwrap_or_default())
    }

    fn append(&self, record: &RunRecord) -> Result<()> {
        let mut guard = self.ensure_keys()?;
        let keys = guard.as_mut().expect("cache loaded by ensure_keys");

        let key = record.key();
        if keys.contains(&key) {
            return Err(ArgusError::Persistence(format!(
                "duplicate run identity: {}",
                key
            )));
        }

        // Write the full line before touching the cache; the file is the
        // source of truth.
        self.trim_partial_tail()?;
        let line = serde_json::to_string(&wire::to_wire(record)?)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.sync_data()?;

        keys.insert(key);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RunRecord>> {
        self.read_records()
    }
}
