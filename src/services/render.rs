// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Human-readable and map renderings of the record set.

use std::fmt::Write as _;

use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::{json, Value};

use crate::models::{ActivityRecord, DayPart, MarkerCategory};
use crate::services::location::{extract_address, maps_search_url};
use crate::services::time::classify_day_part;

/// Extra field naming a record's marker category.
pub const CATEGORY_KEY: &str = "category";

/// Render records as a Markdown document, in the order given.
pub fn render_markdown(records: &[ActivityRecord]) -> String {
    let mut out = String::from("# Kids Activities\n\n");

    for record in records {
        let _ = writeln!(out, "## {}\n", record.display_name());

        if let Some(date) = record.date.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "**Date:** {date}\n");
        }
        if let Some(time) = &record.time {
            let time = time.as_text();
            if !time.is_empty() {
                let _ = writeln!(out, "**Time:** {time}\n");
            }
        }
        if let Some(location) = record.location_text() {
            let suffix = if record.location_uncertain {
                " *(ZIP code estimated)*"
            } else {
                ""
            };
            let _ = writeln!(out, "**Location:** {location}{suffix}\n");
        }
        if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "**Description:** {description}\n");
        }
        if let Some(details) = record
            .additional_details
            .as_deref()
            .filter(|d| !d.is_empty())
        {
            let _ = writeln!(out, "**Additional Details:** {details}\n");
        }
        if record.has_extraction_error() {
            let error = record.error.as_deref().unwrap_or_default();
            let _ = writeln!(out, "**Extraction Error:** {error}\n");
        }
        let source = record.source_identifier.as_deref().unwrap_or("Unknown");
        let _ = writeln!(out, "**Source:** {source}\n");
        out.push_str("---\n\n");
    }

    out
}

/// Marker category of a record: the overlay when its `category` matches,
/// otherwise its day-part.
pub fn marker_category(record: &ActivityRecord, overlay: Option<&str>) -> MarkerCategory {
    if let Some(overlay) = overlay {
        let category = record.extra.get(CATEGORY_KEY).and_then(Value::as_str);
        if category.is_some_and(|c| c.eq_ignore_ascii_case(overlay)) {
            return MarkerCategory::Overlay(overlay.to_string());
        }
    }
    let part = record.day_part.unwrap_or_else(|| {
        record
            .time
            .as_ref()
            .map(classify_day_part)
            .unwrap_or(DayPart::Unknown)
    });
    MarkerCategory::DayPart(part)
}

fn legend(overlay: Option<&str>) -> Value {
    let mut categories: Vec<MarkerCategory> =
        DayPart::ALL.iter().copied().map(MarkerCategory::from).collect();
    if let Some(overlay) = overlay {
        categories.push(MarkerCategory::Overlay(overlay.to_string()));
    }
    Value::Array(
        categories
            .iter()
            .map(|c| {
                json!({
                    "value": c.filter_value(),
                    "label": c.label(),
                    "color": c.color(),
                })
            })
            .collect(),
    )
}

/// Build the map feed: one feature per non-archived record with a usable
/// address.
///
/// Features carry no geometry; the page geocodes `address` itself. The
/// collection's foreign members carry the date filter list and the legend.
pub fn marker_feed(
    records: &[ActivityRecord],
    filter_dates: Vec<String>,
    overlay: Option<&str>,
) -> FeatureCollection {
    let mut features = Vec::new();

    for record in records.iter().filter(|r| !r.is_archived) {
        let Some(address) = record.location_text().and_then(extract_address) else {
            tracing::debug!(name = record.display_name(), "No address; not mapped");
            continue;
        };
        let category = marker_category(record, overlay);

        let mut properties = JsonObject::new();
        properties.insert("number".to_string(), json!(features.len() + 1));
        properties.insert("name".to_string(), json!(record.display_name()));
        properties.insert("date".to_string(), json!(record.date));
        properties.insert(
            "time".to_string(),
            json!(record.time.as_ref().map(|t| t.as_text())),
        );
        properties.insert("maps_url".to_string(), json!(maps_search_url(&address)));
        properties.insert("address".to_string(), json!(address));
        properties.insert("day_part".to_string(), json!(category.filter_value()));
        properties.insert("color".to_string(), json!(category.color()));
        properties.insert("source".to_string(), json!(record.source_identifier));

        features.push(Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    tracing::info!(markers = features.len(), dates = filter_dates.len(), "Built marker feed");

    let mut members = JsonObject::new();
    members.insert("filter_dates".to_string(), json!(filter_dates));
    members.insert("legend".to_string(), legend(overlay));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(members),
    }
}
