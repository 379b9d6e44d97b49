// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON file store for the canonical record set.
//!
//! The whole set is read once and written once per run. A missing file is an
//! empty set; a file that cannot be decoded is also treated as empty, loudly,
//! so a bad write never blocks the next run.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::models::ActivityRecord;
use crate::services::ingest::record_from_value;

/// Errors reading or writing the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Record store backed by a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the untyped entries. Missing or corrupt files yield an empty list.
    pub fn load_values(&self) -> Result<Vec<Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No existing store; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        match serde_json::from_str::<Vec<Value>>(&text) {
            Ok(values) => {
                tracing::info!(count = values.len(), path = %self.path.display(), "Loaded existing records");
                Ok(values)
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Store is not a JSON list; starting with an empty set"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Load typed records, skipping entries that do not decode.
    pub fn load(&self) -> Result<Vec<ActivityRecord>, StoreError> {
        let values = self.load_values()?;
        let total = values.len();
        let records: Vec<ActivityRecord> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match record_from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed stored record");
                    None
                }
            })
            .collect();
        if records.len() != total {
            tracing::warn!(kept = records.len(), total, "Some stored records were skipped");
        }
        Ok(records)
    }

    /// Write records, replacing the file.
    pub fn save(&self, records: &[ActivityRecord]) -> Result<(), StoreError> {
        self.write_json(records)?;
        tracing::info!(count = records.len(), path = %self.path.display(), "Saved records");
        Ok(())
    }

    /// Write untyped entries, replacing the file.
    pub fn save_values(&self, values: &[Value]) -> Result<(), StoreError> {
        self.write_json(values)?;
        tracing::info!(count = values.len(), path = %self.path.display(), "Saved records");
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, data: &T) -> Result<(), StoreError> {
        let mut text = serde_json::to_string_pretty(data)?;
        text.push('\n');
        write_text(&self.path, &text)
    }
}

/// Write a text file, creating its parent directory first.
pub fn write_text(path: &Path, text: &str) -> Result<(), StoreError> {
    let io_err = |e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, text).map_err(io_err)
}
