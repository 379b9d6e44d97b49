// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_locator::config::Config;
use activity_locator::models::ActivityRecord;
use activity_locator::services::Pipeline;
use chrono::NaiveDate;
use std::path::Path;

/// Build a date, panicking on bad input.
#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// Test configuration writing into `dir`.
#[allow(dead_code)]
pub fn test_config(dir: &Path) -> Config {
    Config {
        output_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

/// Pipeline anchored to 2025 with `today` fixed.
#[allow(dead_code)]
pub fn test_pipeline(dir: &Path, today: NaiveDate) -> Pipeline {
    Pipeline::new(test_config(dir), today)
}

/// Record with the identity fields set.
#[allow(dead_code)]
pub fn record(name: &str, date: Option<&str>, location: Option<&str>) -> ActivityRecord {
    ActivityRecord {
        name: Some(name.to_string()),
        date: date.map(str::to_string),
        location: location.map(str::to_string),
        ..Default::default()
    }
}
