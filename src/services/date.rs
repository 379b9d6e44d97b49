// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Free-text date resolution.
//!
//! Dates arrive as whatever the flyer or web page printed: ISO strings,
//! US numeric dates, "Sunday, October 15th", "15 Oct 2025". Resolution tries
//! an ordered list of exact formats first and then a short list of regex
//! extractions. The order is the priority: the first strategy that produces a
//! valid calendar date wins.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::config::Config;
use crate::models::ActivityRecord;
use crate::time_utils::{format_iso_date, month_from_name, parse_iso_date, weekday_from_name};

/// Yearless dates further in the past than this roll over to next year.
pub const DEFAULT_ROLLOVER_DAYS: i64 = 180;

/// Extra key holding a `date` value that could not be resolved when
/// `raw_datetime` was already taken.
pub const UNRESOLVED_DATE_KEY: &str = "unresolved_date";

// ─── Exact formats ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatKind {
    /// Format carries a four-digit year
    FullYear,
    /// Format carries a two-digit year
    ShortYear,
    /// No year; the configured current year is assumed
    Yearless,
    /// "<weekday>, " prefix followed by a yearless month-day
    WeekdayYearless,
}

struct ExactFormat {
    name: &'static str,
    format: &'static str,
    kind: FormatKind,
}

const EXACT_FORMATS: &[ExactFormat] = &[
    ExactFormat { name: "iso", format: "%Y-%m-%d", kind: FormatKind::FullYear },
    ExactFormat { name: "us_numeric", format: "%m/%d/%Y", kind: FormatKind::FullYear },
    ExactFormat { name: "us_numeric_short", format: "%m/%d/%y", kind: FormatKind::ShortYear },
    ExactFormat { name: "long_month_day_year", format: "%B %d, %Y", kind: FormatKind::FullYear },
    ExactFormat { name: "short_month_day_year", format: "%b %d, %Y", kind: FormatKind::FullYear },
    ExactFormat { name: "day_long_month_year", format: "%d %B %Y", kind: FormatKind::FullYear },
    ExactFormat { name: "day_short_month_year", format: "%d %b %Y", kind: FormatKind::FullYear },
    ExactFormat { name: "weekday_long_month_day", format: "%B %d", kind: FormatKind::WeekdayYearless },
    ExactFormat { name: "weekday_short_month_day", format: "%b %d", kind: FormatKind::WeekdayYearless },
    ExactFormat { name: "long_month_day", format: "%B %d", kind: FormatKind::Yearless },
    ExactFormat { name: "short_month_day", format: "%b %d", kind: FormatKind::Yearless },
];

// ─── Regex fallbacks ─────────────────────────────────────────

static RE_NUMERIC_TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2,4})").unwrap());
static RE_MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b").unwrap()
});
static RE_DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)\.?,?\s+(\d{4})\b").unwrap()
});
static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());
static RE_WEEKDAY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)\.?,\s*(.+)$").unwrap());

/// A named fallback extraction, tried in order after the exact formats.
struct PatternStrategy {
    name: &'static str,
    apply: fn(&str) -> Option<NaiveDate>,
}

const PATTERN_STRATEGIES: &[PatternStrategy] = &[
    PatternStrategy { name: "numeric_triple", apply: numeric_triple },
    PatternStrategy { name: "month_day_year", apply: month_day_year },
    PatternStrategy { name: "day_month_year", apply: day_month_year },
];

// ─── Phrase detection in scraped text ────────────────────────

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues?|wed|thu(?:rs)?|fri|sat|sun";

static DATE_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Month day range: "April 12-13"
        format!(r"(?i)\b(?:{MONTHS})\.?\s+\d{{1,2}}\s*[-–]\s*\d{{1,2}}\b"),
        // Month day with optional year: "October 15th, 2025"
        format!(r"(?i)\b(?:{MONTHS})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?\b(?:,?\s+\d{{4}})?"),
        // Weekday, month day: "Saturday, April 12"
        format!(r"(?i)\b(?:{WEEKDAYS}),?\s+[a-z]+\.?\s+\d{{1,2}}\b"),
        // Relative: "this Friday", "next weekend"
        format!(r"(?i)\b(?:this|next)\s+(?:{WEEKDAYS}|weekend)\b"),
        // Numeric: "4/12" or "4/12/2025"
        r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static LIKELY_DATE_SIGNALS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)\b(?:{MONTHS})\b"),
        format!(r"(?i)\b(?:{WEEKDAYS})\b"),
        r"\b\d{4}-\d{1,2}-\d{1,2}\b".to_string(),
        r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b".to_string(),
        r"\b\d{1,2}:\d{2}\b".to_string(),
        r"(?i)\b(?:am|pm)\b".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Date phrases whose digits could be misread as clock times
static DATE_DIGIT_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{4}-\d{1,2}-\d{1,2}\b".to_string(),
        r"\b\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}\b".to_string(),
        r"\b\d{1,2}/\d{1,2}\b".to_string(),
        format!(r"(?i)\b(?:{MONTHS})\.?\s+\d{{1,2}}\s*[-–]\s*\d{{1,2}}\b"),
        format!(r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{MONTHS})\b\.?(?:,?\s+\d{{4}}\b)?"),
        format!(r"(?i)\b(?:{MONTHS})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?\b(?:,?\s+\d{{4}}\b)?"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Blank out numeric and month-day date phrases, leaving the rest of the
/// text (weekdays, times) in place.
pub fn strip_date_phrases(text: &str) -> String {
    DATE_DIGIT_PHRASES
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, " ").into_owned())
}

/// Find the first date-looking phrase in a longer scraped fragment.
///
/// The phrase is returned as-is; it may still be relative ("this Friday")
/// and therefore unresolvable by [`DateResolver::resolve_date`].
pub fn extract_date_phrase(text: &str) -> Option<&str> {
    DATE_PHRASES
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str())
}

/// Whether a fragment carries any date or time signal at all.
pub fn is_likely_date(text: &str) -> bool {
    LIKELY_DATE_SIGNALS.iter().any(|re| re.is_match(text))
}

/// Resolves free-text dates relative to a configured year and "today".
#[derive(Debug, Clone)]
pub struct DateResolver {
    current_year: i32,
    today: NaiveDate,
    rollover_days: i64,
}

impl DateResolver {
    pub fn new(current_year: i32, today: NaiveDate) -> Self {
        Self {
            current_year,
            today,
            rollover_days: DEFAULT_ROLLOVER_DAYS,
        }
    }

    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self::new(config.current_year, today).with_rollover_days(config.rollover_days)
    }

    /// Override the yearless rollover window.
    pub fn with_rollover_days(mut self, days: i64) -> Self {
        self.rollover_days = days;
        self
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Resolve a free-text date. Never fails; unparseable text yields `None`.
    pub fn resolve_date(&self, text: &str) -> Option<NaiveDate> {
        let normalized = normalize_date_text(text);
        if normalized.is_empty() {
            return None;
        }

        if let Some(date) = self.parse_exact(&normalized) {
            return Some(date);
        }

        for strategy in PATTERN_STRATEGIES {
            if let Some(date) = (strategy.apply)(&normalized) {
                tracing::trace!(strategy = strategy.name, %date, "Date resolved by pattern");
                return Some(date);
            }
        }

        tracing::warn!(text, "Could not parse date");
        None
    }

    /// Try only the exact formats, in priority order.
    pub fn parse_exact(&self, text: &str) -> Option<NaiveDate> {
        let normalized = normalize_date_text(text);
        EXACT_FORMATS.iter().find_map(|fmt| {
            let date = self.try_format(fmt, &normalized)?;
            tracing::trace!(format = fmt.name, %date, "Date resolved by exact format");
            Some(date)
        })
    }

    fn try_format(&self, fmt: &ExactFormat, text: &str) -> Option<NaiveDate> {
        match fmt.kind {
            FormatKind::FullYear => {
                let date = NaiveDate::parse_from_str(text, fmt.format).ok()?;
                // chrono reads "25" for %Y as year 25; leave those to %y
                (date.year() >= 1000).then_some(date)
            }
            FormatKind::ShortYear => NaiveDate::parse_from_str(text, fmt.format).ok(),
            FormatKind::Yearless => self.parse_yearless(text, fmt.format),
            FormatKind::WeekdayYearless => {
                let caps = RE_WEEKDAY_PREFIX.captures(text)?;
                weekday_from_name(&caps[1])?;
                self.parse_yearless(&caps[2], fmt.format)
            }
        }
    }

    fn parse_yearless(&self, text: &str, format: &str) -> Option<NaiveDate> {
        let with_year = format!("{text} {}", self.current_year);
        let date = NaiveDate::parse_from_str(&with_year, &format!("{format} %Y")).ok()?;
        Some(self.roll_forward_if_stale(date))
    }

    /// Yearless dates far in the past describe next year's occurrence.
    fn roll_forward_if_stale(&self, date: NaiveDate) -> NaiveDate {
        if (self.today - date).num_days() > self.rollover_days {
            if let Some(next) = date.with_year(date.year() + 1) {
                tracing::debug!(%date, %next, "Rolled yearless date into next year");
                return next;
            }
        }
        date
    }

    /// Per-record pass: bring `date` into canonical form.
    ///
    /// A free-text `date` is resolved or cleared; when cleared its text is
    /// kept in `raw_datetime` (if that was empty) so later passes can still
    /// read it. A missing `date` is filled from a date phrase inside
    /// `raw_datetime` when one resolves.
    pub fn resolve_record(&self, record: &mut ActivityRecord) {
        let current = record
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(ToOwned::to_owned);

        match current {
            Some(text) => {
                if parse_iso_date(&text).is_some() {
                    record.date = Some(text);
                    return;
                }
                match self.resolve_date(&text) {
                    Some(date) => {
                        let canonical = format_iso_date(date);
                        tracing::debug!(from = %text, to = %canonical, "Normalized date");
                        record.date = Some(canonical);
                    }
                    None => {
                        record.date = None;
                        if record.raw_datetime_text().is_none() {
                            record.raw_datetime = Some(text);
                        } else {
                            record
                                .extra
                                .insert(UNRESOLVED_DATE_KEY.to_string(), text.into());
                        }
                    }
                }
            }
            None => {
                record.date = None;
                let Some(raw) = record.raw_datetime_text() else {
                    return;
                };
                let Some(phrase) = extract_date_phrase(raw) else {
                    return;
                };
                if let Some(date) = self.resolve_date(phrase) {
                    record.date = Some(format_iso_date(date));
                }
            }
        }
    }
}

/// Trim, collapse whitespace and drop ordinal suffixes ("15th" -> "15").
fn normalize_date_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_ORDINAL.replace_all(&collapsed, "$1").into_owned()
}

fn expand_year(year: &str) -> Option<i32> {
    let year = if year.len() == 2 {
        format!("20{year}")
    } else {
        year.to_string()
    };
    let year: i32 = year.parse().ok()?;
    (year >= 1000).then_some(year)
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `D/D/Y` read as MM/DD/YYYY first, DD/MM/YYYY second.
fn numeric_triple(text: &str) -> Option<NaiveDate> {
    let caps = RE_NUMERIC_TRIPLE.captures(text)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;
    ymd(year, first, second).or_else(|| ymd(year, second, first))
}

/// "October 15, 2025"
fn month_day_year(text: &str) -> Option<NaiveDate> {
    RE_MONTH_DAY_YEAR.captures_iter(text).find_map(|caps| {
        let month = month_from_name(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        ymd(year, month, day)
    })
}

/// "15 October 2025"
fn day_month_year(text: &str) -> Option<NaiveDate> {
    RE_DAY_MONTH_YEAR.captures_iter(text).find_map(|caps| {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        let year: i32 = caps[3].parse().ok()?;
        ymd(year, month, day)
    })
}
