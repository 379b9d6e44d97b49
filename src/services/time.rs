// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-range parsing and day-part classification.

use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::{Captures, Regex};

use crate::models::{ActivityRecord, DayPart, TimeValue};
use crate::services::date::strip_date_phrases;

/// Parsed start/end of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

// Range shapes, most general first. Each omits minutes or a meridiem on one
// side; all share the group names sh/sm/sap (start) and eh/em/eap (end).
static RANGE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    const SEP: &str = r"\s*(?:-|–|—|to)+\s*";
    vec![
        (
            "full_range",
            format!(
                r"(?i)\b(?P<sh>\d{{1,2}})(?::?(?P<sm>\d{{2}}))?\s*(?P<sap>am|pm)?{SEP}(?P<eh>\d{{1,2}})(?::?(?P<em>\d{{2}}))?\s*(?P<eap>am|pm)?"
            ),
        ),
        (
            "bare_start_hour",
            format!(
                r"(?i)\b(?P<sh>\d{{1,2}})\s*(?P<sap>am|pm){SEP}(?P<eh>\d{{1,2}})(?::?(?P<em>\d{{2}}))?\s*(?P<eap>am|pm)?"
            ),
        ),
        (
            "bare_end_hour",
            format!(
                r"(?i)\b(?P<sh>\d{{1,2}})(?::?(?P<sm>\d{{2}}))?\s*(?P<sap>am|pm)?{SEP}(?P<eh>\d{{1,2}})\s*(?P<eap>am|pm)?"
            ),
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(&pattern).unwrap()))
    .collect()
});

static RE_SINGLE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<h>\d{1,2})(?::?(?P<m>\d{2}))?\s*(?P<ap>am|pm)?").unwrap()
});
static RE_MERIDIEM_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm)").unwrap());
static RE_24H_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?(?:\s*h)?").unwrap());
static RE_STRUCTURED_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "am" => Some(Meridiem::Am),
            "pm" => Some(Meridiem::Pm),
            _ => None,
        }
    }
}

fn to_24h(hour: u32, meridiem: Option<Meridiem>) -> u32 {
    match meridiem {
        Some(Meridiem::Pm) if hour < 12 => hour + 12,
        Some(Meridiem::Am) if hour == 12 => 0,
        _ => hour,
    }
}

fn group_u32(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn group_meridiem(caps: &Captures<'_>, name: &str) -> Option<Meridiem> {
    caps.name(name).and_then(|m| Meridiem::parse(m.as_str()))
}

/// Turn one range match into clock times, or `None` if the values are not a
/// valid time of day.
fn range_from_captures(caps: &Captures<'_>) -> Option<TimeRange> {
    let start_hour = group_u32(caps, "sh")?;
    let start_minute = group_u32(caps, "sm").unwrap_or(0);
    let end_hour = group_u32(caps, "eh")?;
    let end_minute = group_u32(caps, "em").unwrap_or(0);

    let start_meridiem = group_meridiem(caps, "sap");
    // An omitted end meridiem repeats the start's ("3:00 - 5:00 PM" aside)
    let end_meridiem = group_meridiem(caps, "eap").or(start_meridiem);

    let end_24 = to_24h(end_hour, end_meridiem);
    let mut start_24 = to_24h(start_hour, start_meridiem);
    if start_meridiem.is_none() && end_meridiem.is_some() {
        // "1-3 PM" starts at 1 PM, but "11-1 PM" still starts at 11 AM
        let candidate = to_24h(start_hour, end_meridiem);
        if candidate <= end_24 {
            start_24 = candidate;
        }
    }

    let mut end_24 = end_24;
    if end_24 < start_24 && start_24 - end_24 < 12 {
        // "10-2" means 10 AM to 2 PM, not a negative range
        end_24 += 12;
    }

    Some(TimeRange {
        start: NaiveTime::from_hms_opt(start_24, start_minute, 0)?,
        end: NaiveTime::from_hms_opt(end_24, end_minute, 0)?,
    })
}

/// Parse a time or time range such as "3 PM - 5:00 PM" or "10-2".
///
/// A lone time becomes a one-hour event. Returns `None` when nothing
/// resembling a valid time is found.
pub fn resolve_time_range(text: &str) -> Option<TimeRange> {
    if text.trim().is_empty() {
        return None;
    }

    for (name, pattern) in RANGE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        if let Some(range) = range_from_captures(&caps) {
            tracing::trace!(strategy = name, ?range, "Time range parsed");
            return Some(range);
        }
    }

    let caps = RE_SINGLE_TIME.captures(text)?;
    let hour = to_24h(group_u32(&caps, "h")?, group_meridiem(&caps, "ap"));
    let minute = group_u32(&caps, "m").unwrap_or(0);
    Some(TimeRange {
        start: NaiveTime::from_hms_opt(hour, minute, 0)?,
        end: NaiveTime::from_hms_opt(hour + 1, minute, 0)?,
    })
}

/// Starting hour of a free-text time, or `None` if nothing parses.
fn start_hour_of_text(text: &str) -> Option<u32> {
    if let Some(range) = resolve_time_range(text) {
        return Some(range.start.hour());
    }
    if let Some(caps) = RE_MERIDIEM_TIME.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        return Some(to_24h(hour, Meridiem::parse(&caps[3])));
    }
    let caps = RE_24H_TIME.captures(text)?;
    caps[1].parse().ok()
}

/// Bucket free text by its starting hour.
pub fn classify_text(text: &str) -> DayPart {
    match start_hour_of_text(text) {
        Some(hour) => DayPart::from_hour(hour),
        None => DayPart::Unknown,
    }
}

/// Classify a time value into a day-part bucket. Never fails.
pub fn classify_day_part(value: &TimeValue) -> DayPart {
    match value {
        TimeValue::FreeText(text) => classify_text(text),
        TimeValue::Structured { start, .. } => {
            let Some(start) = start.as_deref() else {
                return DayPart::Unknown;
            };
            RE_STRUCTURED_START
                .captures(start.trim())
                .and_then(|caps| caps[1].parse::<u32>().ok())
                .map(DayPart::from_hour)
                .unwrap_or(DayPart::Unknown)
        }
        TimeValue::Other(other) => {
            tracing::warn!(value = %other, "Time value is not a string or a recognized format");
            DayPart::Unknown
        }
    }
}

/// Per-record pass: derive `day_part` from `time`, falling back to the
/// original date/time phrase when `time` says nothing useful. Date phrases
/// are blanked out first so their digits are not read as clock times.
pub fn resolve_record(record: &mut ActivityRecord) {
    let from_time = record
        .time
        .as_ref()
        .map(classify_day_part)
        .unwrap_or(DayPart::Unknown);

    let part = match (from_time, record.raw_datetime_text()) {
        (DayPart::Unknown, Some(raw)) => classify_text(&strip_date_phrases(raw)),
        (part, _) => part,
    };

    if part == DayPart::Unknown {
        tracing::debug!(name = record.display_name(), "No usable start time");
    }
    record.day_part = Some(part);
}
