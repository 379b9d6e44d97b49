// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch normalization pipeline.
//!
//! Incoming records get their dates and times resolved one at a time. The
//! batch-wide stages (location completion, staleness correction) run under a
//! guard: if one fails or panics, the records as they stood are written to a
//! recovery file and the run stops. The result is merged into the persisted
//! set and sorted by date.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDate;
use serde_json::Value;

use crate::config::Config;
use crate::db::{files, RecordStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::ActivityRecord;
use crate::services::date::DateResolver;
use crate::services::location::LocationResolver;
use crate::services::merge::{MergeOutcome, RecordMerger};
use crate::services::staleness::StalenessCorrector;
use crate::services::time;

/// The normalization passes, configured for one run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    dates: DateResolver,
    locations: LocationResolver,
    staleness: StalenessCorrector,
    merger: RecordMerger,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Pipeline {
    pub fn new(config: Config, today: NaiveDate) -> Self {
        let dates = DateResolver::from_config(&config, today);
        Self {
            locations: LocationResolver::from_config(&config),
            staleness: StalenessCorrector::from_config(&config, today),
            merger: RecordMerger::new(dates.clone()),
            dates,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn merger(&self) -> &RecordMerger {
        &self.merger
    }

    /// Per-record passes: canonical date, then day-part.
    pub fn resolve_records(&self, records: &mut [ActivityRecord]) {
        for record in records.iter_mut() {
            self.dates.resolve_record(record);
            time::resolve_record(record);
        }
        tracing::debug!(count = records.len(), "Resolved dates and times");
    }

    /// Run a batch stage, snapshotting `records` to `recovery_file` in the
    /// output directory if the stage returns an error or panics.
    pub fn run_stage<F>(
        &self,
        stage: &'static str,
        recovery_file: &str,
        records: &mut [ActivityRecord],
        f: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut [ActivityRecord]) -> anyhow::Result<()>,
    {
        tracing::info!(stage, count = records.len(), "Running stage");
        let reason = match catch_unwind(AssertUnwindSafe(|| f(&mut *records))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => format!("{e:#}"),
            Err(payload) => panic_message(payload.as_ref()),
        };
        Err(self.abort_stage(stage, recovery_file, reason, |store| store.save(&*records)))
    }

    /// Log a failed stage and write its recovery snapshot.
    fn abort_stage<S>(
        &self,
        stage: &'static str,
        recovery_file: &str,
        reason: String,
        save: S,
    ) -> AppError
    where
        S: FnOnce(&RecordStore) -> std::result::Result<(), StoreError>,
    {
        let recovery = self.config.output_dir.join(recovery_file);
        tracing::error!(stage, reason = %reason, recovery = %recovery.display(), "Stage failed; saving records");
        if let Err(e) = save(&RecordStore::new(&recovery)) {
            return e.into();
        }
        AppError::StageAborted {
            stage,
            reason,
            recovery,
        }
    }

    /// Complete locations across the batch. Returns how many changed.
    pub fn complete_locations(&self, records: &mut [ActivityRecord]) -> Result<usize> {
        let mut changed = 0;
        self.run_stage("locations", files::LOCATION_RECOVERY, records, |records| {
            changed = self.locations.complete_all(records);
            Ok(())
        })?;
        Ok(changed)
    }

    /// Correct stale and missing dates across the batch.
    pub fn sanitize(&self, records: &mut [ActivityRecord]) -> Result<()> {
        self.run_stage("sanitize", files::SANITIZE_RECOVERY, records, |records| {
            self.staleness.sanitize(records);
            Ok(())
        })
    }

    /// Correct dates in untyped store entries, under the same guard as
    /// [`Pipeline::sanitize`]. On failure the entries as loaded are saved.
    pub fn sanitize_values(&self, values: Vec<Value>) -> Result<Vec<Value>> {
        self.sanitize_values_with(values, |values| self.staleness.sanitize_values(values))
    }

    fn sanitize_values_with<F>(&self, values: Vec<Value>, f: F) -> Result<Vec<Value>>
    where
        F: FnOnce(Vec<Value>) -> Vec<Value>,
    {
        tracing::info!(stage = "sanitize", count = values.len(), "Running stage");
        let snapshot = values.clone();
        match catch_unwind(AssertUnwindSafe(|| f(values))) {
            Ok(values) => Ok(values),
            Err(payload) => Err(self.abort_stage(
                "sanitize",
                files::SANITIZE_RECOVERY,
                panic_message(payload.as_ref()),
                |store| store.save_values(&snapshot),
            )),
        }
    }

    /// Correct dates in the stored entries in place, then complete their
    /// locations. Returns the stored records sorted by date.
    pub fn sanitize_store(&self, store: &RecordStore) -> Result<Vec<ActivityRecord>> {
        let values = self.sanitize_values(store.load_values()?)?;
        store.save_values(&values)?;

        let mut records = store.load()?;
        if self.complete_locations(&mut records)? > 0 {
            store.save(&records)?;
        }
        self.merger.sort_by_date(&mut records);
        Ok(records)
    }

    /// Normalize `incoming` and merge it into `existing`.
    ///
    /// Batch stages see existing and incoming records together, so stale
    /// stored dates are corrected before identity keys are compared and
    /// stored locations serve as siblings for new ones.
    pub fn run(
        &self,
        existing: Vec<ActivityRecord>,
        incoming: Vec<ActivityRecord>,
    ) -> Result<MergeOutcome> {
        let split = existing.len();
        let mut all = existing;
        all.extend(incoming);

        self.resolve_records(&mut all[split..]);
        self.complete_locations(&mut all)?;
        self.sanitize(&mut all)?;

        let incoming = all.split_off(split);
        let mut outcome = self.merger.merge(all, incoming);
        self.merger.sort_by_date(&mut outcome.records);
        Ok(outcome)
    }
}
