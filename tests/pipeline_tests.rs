// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end pipeline tests.
//!
//! These drive extraction replay, normalization, merging and persistence the
//! way the binary does, using the saved responses under tests/fixtures/.

mod common;

use activity_locator::db::RecordStore;
use activity_locator::models::{ActivityRecord, DayPart};
use activity_locator::services::ingest::{extract_all, parse_payload, records_from_values};
use activity_locator::services::{RawResponseExtractor, ScrapeFileExtractor};
use common::{date, record, test_pipeline};
use std::path::Path;

const RAW_DIR: &str = "tests/fixtures/raw_responses";
const SCRAPE_FILE: &str = "tests/fixtures/scraped_weekend.json";

fn replay_fixtures() -> Vec<ActivityRecord> {
    let extractor = RawResponseExtractor::new(RAW_DIR);
    let sources = extractor.discover().expect("fixtures directory exists");
    extract_all(&extractor, &sources)
}

fn find<'a>(records: &'a [ActivityRecord], name: &str) -> &'a ActivityRecord {
    records
        .iter()
        .find(|r| r.name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("no record named {name}"))
}

#[test]
fn test_duplicate_soccer_practice_keeps_first_seen() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));

    let mut first = record("Soccer Practice", Some("April 13, 2025"), Some("Zilker Park, Austin, TX 78704"));
    first.description = Some("first".to_string());
    let mut second = record("Soccer Practice", Some("2025-04-13"), Some("zilker park, Austin, TX 78704"));
    second.description = Some("second".to_string());

    let outcome = pipeline.run(Vec::new(), vec![first, second]).unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.skipped, 1);
    let kept = &outcome.records[0];
    assert_eq!(kept.date.as_deref(), Some("2025-04-13"));
    assert_eq!(kept.description.as_deref(), Some("first"));
    assert_eq!(kept.location.as_deref(), Some("Zilker Park, Austin, TX 78704"));
}

#[test]
fn test_replay_normalizes_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    // 2025-04-01 is a Tuesday
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));

    let incoming = replay_fixtures();
    assert_eq!(incoming.len(), 3);

    let outcome = pipeline.run(Vec::new(), incoming).unwrap();
    let records = &outcome.records;
    assert_eq!(outcome.added, 3);

    let soccer = find(records, "Soccer Practice");
    assert_eq!(soccer.date.as_deref(), Some("2025-04-13"));
    assert_eq!(soccer.day_part, Some(DayPart::Afternoon));
    assert_eq!(
        soccer.location.as_deref(),
        Some("Zilker Park, Austin, TX 78701")
    );
    assert!(soccer.location_uncertain);
    assert_eq!(soccer.source_identifier.as_deref(), Some("park_flyer.jpg"));

    let story = find(records, "Story Time");
    assert_eq!(story.date.as_deref(), Some("2025-04-05"));
    assert_eq!(story.day_part, Some(DayPart::Morning));
    assert!(!story.location_uncertain);

    // Sorted by date; the undated error record goes last
    let order: Vec<&str> = records.iter().map(|r| r.display_name()).collect();
    assert_eq!(order, vec!["Story Time", "Soccer Practice", "Unnamed Activity"]);
    assert!(records[2].has_extraction_error());
    assert_eq!(records[2].source_identifier.as_deref(), Some("unreadable.jpg"));
}

#[test]
fn test_rerun_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));
    let store = RecordStore::new(dir.path().join("activities.json"));

    let first = pipeline.run(store.load().unwrap(), replay_fixtures()).unwrap();
    store.save(&first.records).unwrap();

    let second = pipeline.run(store.load().unwrap(), replay_fixtures()).unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.records, first.records);
}

#[test]
fn test_error_markers_from_different_sources_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));
    let unreadable = |source: &str| records_from_values(parse_payload("no json here"), source);

    let mut incoming = unreadable("a.jpg");
    incoming.extend(unreadable("b.jpg"));
    let outcome = pipeline.run(Vec::new(), incoming).unwrap();
    assert_eq!(outcome.skipped, 0);
    let sources: Vec<_> = outcome
        .records
        .iter()
        .filter(|r| r.has_extraction_error())
        .map(|r| r.source_identifier.as_deref())
        .collect();
    assert_eq!(sources, vec![Some("a.jpg"), Some("b.jpg")]);

    // Replaying the same failures does not pile up duplicates
    let mut replay = unreadable("a.jpg");
    replay.extend(unreadable("b.jpg"));
    let again = pipeline.run(outcome.records.clone(), replay).unwrap();
    assert_eq!(again.added, 0);
    assert_eq!(again.records.len(), 2);
}

#[test]
fn test_stale_stored_dates_do_not_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));

    let stored = record("Egg Hunt", Some("2024-04-19"), Some("Mueller Park, Austin, TX 78723"));
    let fresh = record("Egg Hunt", Some("April 19"), Some("Mueller Park, Austin, TX 78723"));

    let outcome = pipeline.run(vec![stored], vec![fresh]).unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].date.as_deref(), Some("2025-04-19"));
}

#[test]
fn test_scrape_input_is_adapted() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));

    let source = ScrapeFileExtractor::source_for(Path::new(SCRAPE_FILE));
    let incoming = extract_all(&ScrapeFileExtractor, &[source]);
    assert_eq!(incoming.len(), 2);

    let outcome = pipeline.run(Vec::new(), incoming).unwrap();
    let puppets = find(&outcome.records, "Puppet Show");
    assert_eq!(
        puppets.location.as_deref(),
        Some("Windsor Park Library, 5833 Westminster Dr, Austin, TX, 78723")
    );
    assert!(!puppets.location_uncertain);
    assert_eq!(
        puppets.additional_details.as_deref(),
        Some("Age: 3-8. Cost: Free. Registration: No registration needed")
    );
    assert_eq!(
        puppets.source_identifier.as_deref(),
        Some("https://example.com/events/puppet-show")
    );
    assert_eq!(puppets.extra["source_type"], "web_scrape");
    assert_eq!(puppets.day_part, Some(DayPart::Morning));

    let hike = find(&outcome.records, "Night Hike");
    assert_eq!(hike.error.as_deref(), Some("details page timed out"));
    assert_eq!(hike.day_part, Some(DayPart::Evening));
}

#[test]
fn test_sanitize_store_fixes_dates_and_locations() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = test_pipeline(dir.path(), date(2025, 4, 1));
    let store = RecordStore::new(dir.path().join("activities.json"));
    std::fs::write(
        store.path(),
        r#"[
  {"activity_name": "Swim", "date": "2024-06-01", "location": "Big Stacy Pool"},
  {"activity_name": "Art", "date": "2025-05-02", "location": "Library, 800 Guadalupe St, Austin, TX 78701"}
]"#,
    )
    .unwrap();

    let records = pipeline.sanitize_store(&store).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.display_name()).collect();
    assert_eq!(names, vec!["Art", "Swim"]);

    let saved = store.load().unwrap();
    let swim = find(&saved, "Swim");
    assert_eq!(swim.date.as_deref(), Some("2025-06-01"));
    assert_eq!(swim.location.as_deref(), Some("Big Stacy Pool, Austin, TX 78701"));
    assert!(swim.location_uncertain);
}

#[test]
fn test_store_round_trip_keeps_extra_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activities.json");
    std::fs::write(
        &path,
        r#"[{"activity_name": "Swim", "source_file": "pool.jpg", "source_name": "city", "location_uncertain": true, "location": "Pool 78701"}]"#,
    )
    .unwrap();

    let store = RecordStore::new(&path);
    let records = store.load().unwrap();
    store.save(&records).unwrap();
    let reloaded = store.load().unwrap();

    assert_eq!(reloaded, records);
    assert_eq!(reloaded[0].source_identifier.as_deref(), Some("pool.jpg"));
    assert_eq!(reloaded[0].extra["source_name"], "city");
    assert!(reloaded[0].location_uncertain);
}
