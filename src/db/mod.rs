// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer (JSON files).

pub mod json_store;

pub use json_store::{write_text, RecordStore, StoreError};

/// Output file names inside the output directory.
pub mod files {
    pub const MARKDOWN: &str = "activities.md";
    pub const MARKER_FEED: &str = "activities.geojson";
    /// Snapshot written when date correction aborts
    pub const SANITIZE_RECOVERY: &str = "activities_error.json";
    /// Snapshot written when location completion aborts
    pub const LOCATION_RECOVERY: &str = "locations_error.json";
    pub const RAW_RESPONSES_DIR: &str = "raw_responses";
}
