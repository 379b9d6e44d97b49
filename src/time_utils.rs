// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar names and canonical date strings.

use chrono::{Datelike, Local, NaiveDate, Weekday};

/// Canonical on-disk date format.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the local time zone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` string.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    // chrono accepts short years for %Y; canonical dates always carry four digits
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT).ok()
}

/// Map a month name or abbreviation to its number (1-12).
///
/// Only the first three letters are significant, so "Sept", "Sep" and
/// "September" all resolve to 9.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Map a weekday name or common abbreviation to a [`Weekday`].
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// Next occurrence of `weekday` strictly after `today`.
///
/// When `today` already falls on `weekday` the result is one week out.
pub fn next_weekday_after(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut days_ahead = (target - current).rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    today + chrono::Duration::days(days_ahead)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date_rejects_short_years() {
        assert_eq!(parse_iso_date("2025-04-13"), Some(date(2025, 4, 13)));
        assert_eq!(parse_iso_date("25-04-13"), None);
        assert_eq!(parse_iso_date("April 13"), None);
    }

    #[test]
    fn test_month_from_name_uses_prefix() {
        assert_eq!(month_from_name("September"), Some(9));
        assert_eq!(month_from_name("sept"), Some(9));
        assert_eq!(month_from_name("DEC"), Some(12));
        assert_eq!(month_from_name("mo"), None);
        assert_eq!(month_from_name("Monday"), None);
    }

    #[test]
    fn test_weekday_from_name() {
        assert_eq!(weekday_from_name("Friday"), Some(Weekday::Fri));
        assert_eq!(weekday_from_name("tues"), Some(Weekday::Tue));
        assert_eq!(weekday_from_name("someday"), None);
    }

    #[test]
    fn test_next_weekday_never_returns_today() {
        // 2025-04-16 is a Wednesday
        let wednesday = date(2025, 4, 16);
        assert_eq!(next_weekday_after(wednesday, Weekday::Fri), date(2025, 4, 18));
        assert_eq!(next_weekday_after(wednesday, Weekday::Wed), date(2025, 4, 23));
        assert_eq!(next_weekday_after(wednesday, Weekday::Mon), date(2025, 4, 21));
    }
}
