// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Resolver-level problems never surface here: unparseable dates, times and
//! locations degrade to `None`/unknown inside the passes. These variants cover
//! the failures an operator has to know about.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::db::StoreError;
use crate::services::ingest::IngestError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// A batch stage failed; the in-progress records were snapshotted.
    #[error("Stage '{stage}' aborted: {reason} (records saved to {})", .recovery.display())]
    StageAborted {
        stage: &'static str,
        reason: String,
        recovery: PathBuf,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Path of the recovery snapshot, if this error produced one.
    pub fn recovery_path(&self) -> Option<&PathBuf> {
        match self {
            AppError::StageAborted { recovery, .. } => Some(recovery),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AppError>;
