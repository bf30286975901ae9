//! Durable storage for the relay cursor.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::{PersistenceError, Result};

/// On-disk form of the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorRecord {
    /// Next event id to request from the source.
    pub offset: i64,
    /// When the record was written.
    pub updated_at: DateTime<Utc>,
}

impl CursorRecord {
    /// Creates a record stamped with the current time.
    pub fn new(offset: i64) -> Self {
        Self {
            offset,
            updated_at: Utc::now(),
        }
    }
}

/// A single JSON file holding the last saved cursor.
///
/// ```text
/// {
///   "offset": 1042,
///   "updated_at": "2026-10-18T09:14:03.512Z"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CursorFile {
    path: PathBuf,
}

impl CursorFile {
    /// Creates a store backed by `path`. Nothing is touched on disk yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved offset, or `None` if nothing was saved yet.
    pub fn load(&self) -> Result<Option<i64>> {
        Ok(self.load_record()?.map(|record| record.offset))
    }

    /// Loads the full saved record.
    pub fn load_record(&self) -> Result<Option<CursorRecord>> {
        let record: Option<CursorRecord> = read_json_optional(&self.path)?;
        match record {
            Some(record) if record.offset < 0 => Err(PersistenceError::InvalidData {
                path: self.path.clone(),
                reason: format!("negative offset {}", record.offset),
            }),
            other => Ok(other),
        }
    }

    /// Saves `offset`, replacing any previous record.
    pub fn save(&self, offset: i64) -> Result<()> {
        if offset < 0 {
            return Err(PersistenceError::InvalidData {
                path: self.path.clone(),
                reason: format!("negative offset {}", offset),
            });
        }
        atomic_write_json(&self.path, &CursorRecord::new(offset))
    }
}
