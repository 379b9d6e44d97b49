// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staleness correction.
//!
//! Extracted dates often carry last year's year, or no date at all. This pass
//! moves past-year dates into the current year and infers a date for undated
//! records from weekday or month-day mentions in their text. Running it twice
//! changes nothing the second time.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::Value;

use crate::config::Config;
use crate::models::ActivityRecord;
use crate::time_utils::{
    format_iso_date, month_from_name, next_weekday_after, parse_iso_date, weekday_from_name,
};

const MONTH_NAMES: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static RE_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thu|fri|sat|sun)\b",
    )
    .unwrap()
});
static RE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_NAMES})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"
    ))
    .unwrap()
});
static RE_MONTH_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b({MONTH_NAMES})\b")).unwrap());

/// What one text source says about an undated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateSignal {
    Date(NaiveDate),
    /// A month was named but no usable day.
    MonthOnly(u32),
    Nothing,
}

/// Moves stale dates forward and infers missing ones.
#[derive(Debug, Clone)]
pub struct StalenessCorrector {
    current_year: i32,
    today: NaiveDate,
}

impl StalenessCorrector {
    pub fn new(current_year: i32, today: NaiveDate) -> Self {
        Self {
            current_year,
            today,
        }
    }

    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self::new(config.current_year, today)
    }

    /// Correct every record in place. Returns how many dates changed.
    pub fn sanitize(&self, records: &mut [ActivityRecord]) -> usize {
        let changed = records
            .iter_mut()
            .map(|record| self.sanitize_record(record))
            .filter(|changed| *changed)
            .count();
        tracing::info!(changed, total = records.len(), "Sanitized dates");
        changed
    }

    /// Same as [`sanitize`](Self::sanitize) over untyped store entries.
    ///
    /// Entries that are not records are passed through untouched with a
    /// warning.
    pub fn sanitize_values(&self, values: Vec<Value>) -> Vec<Value> {
        let mut changed = 0usize;
        let total = values.len();
        let sanitized = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                if !value.is_object() {
                    tracing::warn!(index, "Skipping entry that is not an object");
                    return value;
                }
                let mut record: ActivityRecord = match serde_json::from_value(value.clone()) {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::warn!(index, error = %e, "Skipping malformed record");
                        return value;
                    }
                };
                if !self.sanitize_record(&mut record) {
                    return value;
                }
                changed += 1;
                serde_json::to_value(&record).unwrap_or(value)
            })
            .collect();
        tracing::info!(changed, total, "Sanitized dates");
        sanitized
    }

    /// Correct a single record. Returns whether its date changed.
    pub fn sanitize_record(&self, record: &mut ActivityRecord) -> bool {
        let date = record
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let corrected = match date {
            Some(text) => parse_iso_date(text).and_then(|d| self.bring_forward(d)),
            None => self.infer_date(record).map(|d| self.bring_forward(d).unwrap_or(d)),
        };

        let Some(corrected) = corrected else {
            return false;
        };
        let corrected = format_iso_date(corrected);
        tracing::debug!(
            name = record.display_name(),
            from = record.date.as_deref().unwrap_or("null"),
            to = %corrected,
            "Sanitized date"
        );
        record.date = Some(corrected);
        true
    }

    /// Same month and day in the current year, for dates in a past year.
    fn bring_forward(&self, date: NaiveDate) -> Option<NaiveDate> {
        if date.year() >= self.current_year {
            return None;
        }
        let moved = date.with_year(self.current_year);
        if moved.is_none() {
            tracing::warn!(%date, year = self.current_year, "Date has no counterpart in current year");
        }
        moved
    }

    /// Infer a date from `raw_datetime`, then from the other text fields.
    fn infer_date(&self, record: &ActivityRecord) -> Option<NaiveDate> {
        let raw = record.raw_datetime_text().map(str::to_lowercase);
        let auxiliary = record.auxiliary_text();
        let sources = [("raw_datetime", raw.as_deref()), ("text", Some(auxiliary.as_str()))];

        for (source, text) in sources {
            let Some(text) = text else {
                continue;
            };
            match self.signal_in(text) {
                DateSignal::Date(date) => {
                    tracing::debug!(source, %date, "Inferred date");
                    return Some(date);
                }
                DateSignal::MonthOnly(month) => {
                    tracing::info!(
                        source,
                        month,
                        name = record.display_name(),
                        "Only a month was found; leaving date empty"
                    );
                    return None;
                }
                DateSignal::Nothing => {}
            }
        }
        None
    }

    fn signal_in(&self, text: &str) -> DateSignal {
        if let Some(weekday) = RE_WEEKDAY
            .captures(text)
            .and_then(|caps| weekday_from_name(&caps[1]))
        {
            return DateSignal::Date(next_weekday_after(self.today, weekday));
        }

        let month_day = RE_MONTH_DAY.captures_iter(text).find_map(|caps| {
            let month = month_from_name(&caps[1])?;
            let day: u32 = caps[2].parse().ok()?;
            NaiveDate::from_ymd_opt(self.current_year, month, day)
        });
        if let Some(date) = month_day {
            return DateSignal::Date(date);
        }

        match RE_MONTH_ONLY
            .captures(text)
            .and_then(|caps| month_from_name(&caps[1]))
        {
            Some(month) => DateSignal::MonthOnly(month),
            None => DateSignal::Nothing,
        }
    }
}
