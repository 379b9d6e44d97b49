// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merging new records into the persisted set, plus date ordering.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{ActivityRecord, IdentityKey};
use crate::services::date::DateResolver;

/// Result of a merge, with counts for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub records: Vec<ActivityRecord>,
    pub added: usize,
    pub skipped: usize,
}

/// Combines batches by identity key and orders them by date.
#[derive(Debug, Clone)]
pub struct RecordMerger {
    dates: DateResolver,
}

impl RecordMerger {
    pub fn new(dates: DateResolver) -> Self {
        Self { dates }
    }

    /// Append every incoming record whose identity key is not already
    /// present. On a collision the existing record is kept unchanged.
    pub fn merge(
        &self,
        existing: Vec<ActivityRecord>,
        incoming: Vec<ActivityRecord>,
    ) -> MergeOutcome {
        let mut seen: HashSet<IdentityKey> =
            existing.iter().map(ActivityRecord::identity_key).collect();
        let mut records = existing;
        let mut added = 0;
        let mut skipped = 0;

        for record in incoming {
            if seen.insert(record.identity_key()) {
                records.push(record);
                added += 1;
            } else {
                tracing::debug!(name = record.display_name(), "Skipping duplicate record");
                skipped += 1;
            }
        }

        tracing::info!(added, skipped, total = records.len(), "Merged records");
        MergeOutcome {
            records,
            added,
            skipped,
        }
    }

    fn parsed_date(&self, date: Option<&str>) -> Option<NaiveDate> {
        date.and_then(|d| self.dates.parse_exact(d))
    }

    /// Stable ascending sort by date; missing or unparseable dates go last.
    pub fn sort_by_date(&self, records: &mut [ActivityRecord]) {
        records.sort_by_cached_key(|record| {
            let date = self.parsed_date(record.date.as_deref());
            (date.is_none(), date)
        });
    }

    /// Distinct dates with at least one non-archived record.
    ///
    /// Parseable dates come first in chronological order, followed by the
    /// rest in first-seen order.
    pub fn active_dates(&self, records: &[ActivityRecord]) -> Vec<String> {
        let mut seen = HashSet::new();
        let active: Vec<&str> = records
            .iter()
            .filter(|r| !r.is_archived)
            .filter_map(|r| r.date.as_deref().filter(|d| !d.trim().is_empty()))
            .filter(|d| seen.insert(*d))
            .collect();

        let mut parsed: Vec<(NaiveDate, &str)> = Vec::new();
        let mut unparsed: Vec<&str> = Vec::new();
        for date in active {
            match self.dates.parse_exact(date) {
                Some(parsed_date) => parsed.push((parsed_date, date)),
                None => unparsed.push(date),
            }
        }
        parsed.sort();

        parsed
            .into_iter()
            .map(|(_, d)| d)
            .chain(unparsed)
            .map(str::to_string)
            .collect()
    }
}
