// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity record model for storage and rendering.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::DayPart;

/// Display name used when an extractor could not find one.
pub const UNNAMED_ACTIVITY: &str = "Unnamed Activity";

/// One normalized children's activity, as persisted in the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Activity name/title
    #[serde(rename = "activity_name", default)]
    pub name: Option<String>,
    /// Resolved date (`YYYY-MM-DD` once normalized)
    #[serde(default)]
    pub date: Option<String>,
    /// Date/time phrase exactly as the source showed it
    #[serde(default)]
    pub raw_datetime: Option<String>,
    /// Start/end time, free text or structured
    #[serde(default)]
    pub time: Option<TimeValue>,
    /// Venue, street, city, region, postal code
    #[serde(default)]
    pub location: Option<String>,
    /// Whether the postal/region part of `location` was synthesized
    #[serde(default, skip_serializing_if = "is_false")]
    pub location_uncertain: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub additional_details: Option<String>,
    /// Filename or URL the record was extracted from
    #[serde(default)]
    pub source_identifier: Option<String>,
    /// Archived records stay stored but drop out of date filters
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_archived: bool,
    /// Day-part bucket derived from the start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_part: Option<DayPart>,
    /// Extraction error marker; the record is kept for reprocessing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Source-specific fields carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The `time` field: extractors emit either a phrase or a start/end pair.
///
/// Only objects whose keys are `start`/`end` with string or null values read
/// as `Structured`; any other shape is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TimeValue {
    /// e.g. "3:00 PM - 5:00 PM"
    FreeText(String),
    /// Start/end in `HH:MM` 24-hour form
    Structured {
        start: Option<String>,
        end: Option<String>,
    },
    /// Any other JSON shape; classifies as unknown
    Other(Value),
}

impl<'de> Deserialize<'de> for TimeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TimeValue::from(Value::deserialize(deserializer)?))
    }
}

fn is_time_span(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| {
            matches!(key.as_str(), "start" | "end") && (value.is_string() || value.is_null())
        })
}

impl From<Value> for TimeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => TimeValue::FreeText(text),
            Value::Object(map) if is_time_span(&map) => {
                let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                TimeValue::Structured {
                    start: field("start"),
                    end: field("end"),
                }
            }
            other => TimeValue::Other(other),
        }
    }
}

impl TimeValue {
    /// Flatten to text for keyword scans.
    pub fn as_text(&self) -> String {
        match self {
            TimeValue::FreeText(text) => text.clone(),
            TimeValue::Structured { start, end } => match (start, end) {
                (Some(s), Some(e)) => format!("{s} - {e}"),
                (Some(s), None) => s.clone(),
                (None, Some(e)) => e.clone(),
                (None, None) => String::new(),
            },
            TimeValue::Other(value) => value.to_string(),
        }
    }
}

impl std::fmt::Display for TimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Normalized (name, date, location) triplet identifying a real-world event.
///
/// Records with all three empty (typically error markers) have nothing to
/// compare on, so their source identifier is part of the key instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub name: String,
    pub date: String,
    pub location: String,
    pub source: Option<String>,
}

impl ActivityRecord {
    /// Name for display, falling back to "Unnamed Activity".
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_ACTIVITY)
    }

    /// Identity key used for deduplication.
    pub fn identity_key(&self) -> IdentityKey {
        let name = normalize_key_fragment(self.name.as_deref().unwrap_or_default());
        let date = normalize_key_fragment(self.date.as_deref().unwrap_or_default());
        let location = normalize_key_fragment(self.location.as_deref().unwrap_or_default());
        let source = (name.is_empty() && date.is_empty() && location.is_empty())
            .then(|| self.source_identifier.clone().unwrap_or_default());
        IdentityKey {
            name,
            date,
            location,
            source,
        }
    }

    /// Whether an extractor flagged this record as failed.
    pub fn has_extraction_error(&self) -> bool {
        self.error.is_some()
    }

    /// Lower-cased name/time/description/details joined for keyword scans.
    pub fn auxiliary_text(&self) -> String {
        let time = self.time.as_ref().map(TimeValue::as_text).unwrap_or_default();
        [
            self.name.as_deref().unwrap_or_default(),
            time.as_str(),
            self.description.as_deref().unwrap_or_default(),
            self.additional_details.as_deref().unwrap_or_default(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Non-empty `raw_datetime`, if any.
    pub fn raw_datetime_text(&self) -> Option<&str> {
        self.raw_datetime.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Non-empty `location`, if any.
    pub fn location_text(&self) -> Option<&str> {
        self.location.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Lower-case, turn punctuation into separators and collapse whitespace.
pub fn normalize_key_fragment(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_wire_record() {
        let value = json!({
            "activity_name": "Soccer Practice",
            "location": "City Park, 123 Park Avenue, Austin, TX 78701",
            "date": "2023-10-15",
            "time": "3:00 PM - 5:00 PM",
            "description": "Weekly soccer practice",
            "additional_details": null,
            "raw_datetime": "Sunday, October 15th from 3-5 PM",
            "source_identifier": "flyer.jpg",
            "source_type": "image"
        });

        let record: ActivityRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.name.as_deref(), Some("Soccer Practice"));
        assert_eq!(
            record.time,
            Some(TimeValue::FreeText("3:00 PM - 5:00 PM".to_string()))
        );
        assert!(!record.location_uncertain);
        assert_eq!(record.extra.get("source_type"), Some(&json!("image")));
    }

    #[test]
    fn test_structured_time_deserializes() {
        let record: ActivityRecord =
            serde_json::from_value(json!({"time": {"start": "09:30", "end": "11:00"}})).unwrap();
        assert_eq!(
            record.time,
            Some(TimeValue::Structured {
                start: Some("09:30".to_string()),
                end: Some("11:00".to_string()),
            })
        );
    }

    #[test]
    fn test_unrecognized_time_shape_is_kept() {
        let record: ActivityRecord = serde_json::from_value(json!({"time": 1530})).unwrap();
        assert_eq!(record.time, Some(TimeValue::Other(json!(1530))));
    }

    #[test]
    fn test_unrecognized_time_object_round_trips() {
        let value = json!({"time": {"from": "09:00", "until": "10:00"}});
        let record: ActivityRecord = serde_json::from_value(value).unwrap();
        assert_eq!(
            record.time,
            Some(TimeValue::Other(json!({"from": "09:00", "until": "10:00"})))
        );
        let saved = serde_json::to_value(&record).unwrap();
        assert_eq!(saved["time"], json!({"from": "09:00", "until": "10:00"}));

        // A span with an extra key is not a plain span either
        let mixed: ActivityRecord =
            serde_json::from_value(json!({"time": {"start": "09:00", "note": "doors"}})).unwrap();
        assert!(matches!(mixed.time, Some(TimeValue::Other(_))));
    }

    #[test]
    fn test_partial_time_span_deserializes() {
        let record: ActivityRecord =
            serde_json::from_value(json!({"time": {"start": "09:30", "end": null}})).unwrap();
        assert_eq!(
            record.time,
            Some(TimeValue::Structured {
                start: Some("09:30".to_string()),
                end: None,
            })
        );
    }

    #[test]
    fn test_identity_key_separates_unnamed_sources() {
        let marker = |source: &str| ActivityRecord {
            error: Some("Failed to parse response".to_string()),
            source_identifier: Some(source.to_string()),
            ..Default::default()
        };
        assert_ne!(marker("a.jpg").identity_key(), marker("b.jpg").identity_key());
        assert_eq!(marker("a.jpg").identity_key(), marker("a.jpg").identity_key());

        let named = ActivityRecord {
            name: Some("Swim".to_string()),
            source_identifier: Some("a.jpg".to_string()),
            ..Default::default()
        };
        assert_eq!(named.identity_key().source, None);
    }

    #[test]
    fn test_serialize_omits_default_flags() {
        let record = ActivityRecord {
            name: Some("Story Time".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["activity_name"], json!("Story Time"));
        assert!(value.get("location_uncertain").is_none());
        assert!(value.get("is_archived").is_none());
        assert!(value.get("day_part").is_none());
    }

    #[test]
    fn test_display_name_fallback() {
        let record = ActivityRecord::default();
        assert_eq!(record.display_name(), "Unnamed Activity");

        let blank = ActivityRecord {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.display_name(), "Unnamed Activity");
    }

    #[test]
    fn test_identity_key_ignores_case_and_punctuation() {
        let a = ActivityRecord {
            name: Some("Soccer Practice".to_string()),
            date: Some("2025-04-13".to_string()),
            location: Some("City Park, Austin, TX 78701".to_string()),
            ..Default::default()
        };
        let b = ActivityRecord {
            name: Some("soccer  practice".to_string()),
            date: Some("2025-04-13".to_string()),
            location: Some("CITY PARK Austin TX 78701".to_string()),
            ..Default::default()
        };
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_auxiliary_text_is_lowercase() {
        let record = ActivityRecord {
            name: Some("Friday Crafts".to_string()),
            time: Some(TimeValue::FreeText("4 PM".to_string())),
            description: Some("Bring GLUE".to_string()),
            ..Default::default()
        };
        assert_eq!(record.auxiliary_text(), "friday crafts 4 pm bring glue ");
    }
}
