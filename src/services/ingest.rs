// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turning extraction payloads into activity records.
//!
//! Extractors (a vision model reading flyers, a web scraper) hand back loosely
//! structured JSON. This module decodes those payloads, flattens scraper
//! output into the record shape and converts the result into
//! [`ActivityRecord`]s. The extractors themselves sit behind [`Extractor`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::models::ActivityRecord;
use crate::services::date::{is_likely_date, UNRESOLVED_DATE_KEY};

/// Suffix of saved vision-model responses.
pub const RAW_RESPONSE_SUFFIX: &str = "_response.json";

/// Wire names that carry a record's provenance, in priority order.
const SOURCE_WIRE_KEYS: [&str; 3] = ["source_identifier", "source_file", "source_url"];

/// Structured location parts joined after the venue name.
const ADDRESS_KEYS: [&str; 5] = ["street", "address", "city", "state", "ZIP"];

static RE_JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\[.*\]|\{.*\})").unwrap());

/// Errors reading extraction inputs.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Input directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One unit of extractor input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Where the payload lives
    pub path: PathBuf,
    /// Provenance stamped on records that do not name their own
    pub identifier: String,
}

/// Produces raw record values from a source.
///
/// Implementations should report per-record problems as error-marked
/// values rather than failing the whole source.
pub trait Extractor {
    fn extract(&self, source: &Source) -> Result<Vec<Value>, IngestError>;
}

fn read_source(source: &Source) -> Result<String, IngestError> {
    fs::read_to_string(&source.path).map_err(|e| IngestError::Io {
        path: source.path.clone(),
        source: e,
    })
}

/// Replays vision-model responses saved as `<image>_response.json`.
#[derive(Debug, Clone)]
pub struct RawResponseExtractor {
    dir: PathBuf,
}

impl RawResponseExtractor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Saved responses in the directory, sorted by file name. Each source is
    /// attributed to the image it was made from (`<image>.jpg`).
    pub fn discover(&self) -> Result<Vec<Source>, IngestError> {
        if !self.dir.is_dir() {
            return Err(IngestError::MissingDirectory(self.dir.clone()));
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| IngestError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut sources: Vec<Source> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter_map(|path| {
                let file_name = path.file_name()?.to_str()?;
                let image = file_name.strip_suffix(RAW_RESPONSE_SUFFIX)?;
                Some(Source {
                    identifier: format!("{image}.jpg"),
                    path: path.clone(),
                })
            })
            .collect();
        sources.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(count = sources.len(), dir = %self.dir.display(), "Found saved responses");
        Ok(sources)
    }
}

impl Extractor for RawResponseExtractor {
    fn extract(&self, source: &Source) -> Result<Vec<Value>, IngestError> {
        let text = read_source(source)?;
        Ok(parse_payload(&text))
    }
}

/// Reads scraper output files and flattens each entry with
/// [`adapt_scraped`].
#[derive(Debug, Clone, Default)]
pub struct ScrapeFileExtractor;

impl ScrapeFileExtractor {
    pub fn source_for(path: &Path) -> Source {
        let identifier = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Source {
            path: path.to_path_buf(),
            identifier,
        }
    }
}

impl Extractor for ScrapeFileExtractor {
    fn extract(&self, source: &Source) -> Result<Vec<Value>, IngestError> {
        let text = read_source(source)?;
        Ok(parse_payload(&text).into_iter().map(adapt_scraped).collect())
    }
}

/// Decode an extraction payload into raw record values.
///
/// The whole text is tried as JSON first, then the outermost `[...]` or
/// `{...}` span inside it. An object with an `activities` array yields that
/// array. Text that cannot be decoded yields one error-marked record.
pub fn parse_payload(text: &str) -> Vec<Value> {
    let decoded = serde_json::from_str::<Value>(text).or_else(|e| {
        RE_JSON_SPAN
            .find(text)
            .ok_or_else(|| "no JSON object or array found".to_string())
            .and_then(|span| {
                serde_json::from_str::<Value>(span.as_str()).map_err(|_| e.to_string())
            })
    });

    match decoded {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut object)) => match object.remove("activities") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                object.insert("activities".to_string(), other);
                vec![Value::Object(object)]
            }
            None => vec![Value::Object(object)],
        },
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "Unexpected payload structure");
            vec![error_record(&format!(
                "Unexpected JSON structure: {}",
                json_kind(&other)
            ))]
        }
        Err(reason) => {
            tracing::warn!(error = %reason, "Failed to parse extraction payload");
            vec![error_record(&format!("Failed to parse response: {reason}"))]
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn error_record(reason: &str) -> Value {
    json!({
        "activity_name": null,
        "location": null,
        "date": null,
        "time": null,
        "description": null,
        "additional_details": null,
        "raw_datetime": null,
        "error": reason,
    })
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Flatten a structured scraped location into one string.
fn flatten_location(location: &Map<String, Value>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(venue) = non_empty_str(location, "venue_name") {
        parts.push(venue.to_string());
    }
    let address: Vec<&str> = ADDRESS_KEYS
        .iter()
        .filter_map(|key| non_empty_str(location, key))
        .collect();
    if !address.is_empty() {
        parts.push(address.join(", "));
    }
    parts.join(", ")
}

/// Convert one scraper entry into the record wire shape.
///
/// Structured locations are flattened, age/cost/registration become
/// `additional_details` when none is given, and the entry is tagged as a web
/// scrape. Non-objects are returned unchanged.
pub fn adapt_scraped(value: Value) -> Value {
    let Value::Object(entry) = value else {
        return value;
    };

    let mut out = Map::new();
    let mut copy = |from: &str, to: &str| {
        if let Some(text) = non_empty_str(&entry, from) {
            out.insert(to.to_string(), Value::from(text));
        }
    };
    copy("activity_name", "activity_name");
    copy("description", "description");
    copy("raw_datetime", "raw_datetime");
    copy("source_url", "source_url");
    copy("source", "source_name");
    copy("extraction_error", "error");
    copy("error", "error");

    // Scraped date cells sometimes hold a price or venue instead
    if let Some(date) = non_empty_str(&entry, "date") {
        let key = if is_likely_date(date) {
            "date"
        } else {
            tracing::debug!(date, "Scraped date has no date signal");
            UNRESOLVED_DATE_KEY
        };
        out.insert(key.to_string(), Value::from(date));
    }

    match entry.get("location") {
        Some(Value::Object(parts)) => {
            let location = flatten_location(parts);
            if !location.is_empty() {
                out.insert("location".to_string(), Value::from(location));
            }
        }
        Some(Value::String(text)) if !text.trim().is_empty() => {
            out.insert("location".to_string(), Value::from(text.trim()));
        }
        _ => {}
    }

    match entry.get("time") {
        Some(Value::String(text)) if text.trim().is_empty() => {}
        Some(Value::Null) | None => {}
        Some(time) => {
            out.insert("time".to_string(), time.clone());
        }
    }

    let details = match non_empty_str(&entry, "additional_details") {
        Some(details) => details.to_string(),
        None => [
            ("age_range", "Age"),
            ("cost", "Cost"),
            ("registration_info", "Registration"),
        ]
        .iter()
        .filter_map(|(key, label)| non_empty_str(&entry, key).map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join(". "),
    };
    if !details.is_empty() {
        out.insert("additional_details".to_string(), Value::from(details));
    }

    out.insert("source_type".to_string(), Value::from("web_scrape"));
    Value::Object(out)
}

/// Move the first wire provenance key into `source_identifier`.
///
/// Records saved by older tools name their source `source_file` or
/// `source_url`; the rest are dropped so they do not linger as extras.
pub fn normalize_wire_keys(object: &mut Map<String, Value>) {
    let mut identifier = None;
    for key in SOURCE_WIRE_KEYS {
        match object.remove(key) {
            Some(Value::String(text)) if identifier.is_none() && !text.trim().is_empty() => {
                identifier = Some(text);
            }
            _ => {}
        }
    }
    if let Some(identifier) = identifier {
        object.insert("source_identifier".to_string(), Value::from(identifier));
    }
}

/// Decode one wire value into a record.
pub fn record_from_value(value: Value) -> Result<ActivityRecord, serde_json::Error> {
    let value = match value {
        Value::Object(mut object) => {
            normalize_wire_keys(&mut object);
            Value::Object(object)
        }
        other => other,
    };
    serde_json::from_value(value)
}

/// Convert raw values into records attributed to `source`.
///
/// Non-objects and undecodable objects are skipped with a warning. Records
/// that name no source of their own are stamped with `source`.
pub fn records_from_values(values: Vec<Value>, source: &str) -> Vec<ActivityRecord> {
    let total = values.len();
    let records: Vec<ActivityRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            if !value.is_object() {
                tracing::warn!(source, index, "Skipping entry that is not an object");
                return None;
            }
            match record_from_value(value) {
                Ok(mut record) => {
                    if record.source_identifier.is_none() {
                        record.source_identifier = Some(source.to_string());
                    }
                    if let Some(error) = &record.error {
                        tracing::warn!(source, error = %error, "Keeping error-marked record");
                    }
                    Some(record)
                }
                Err(e) => {
                    tracing::warn!(source, index, error = %e, "Skipping malformed record");
                    None
                }
            }
        })
        .collect();
    tracing::debug!(source, kept = records.len(), total, "Converted payload");
    records
}

/// Run an extractor over every source, collecting records.
///
/// A source that cannot be read is logged and skipped; the batch goes on.
pub fn extract_all<E: Extractor>(extractor: &E, sources: &[Source]) -> Vec<ActivityRecord> {
    let mut records = Vec::new();
    for source in sources {
        match extractor.extract(source) {
            Ok(values) => records.extend(records_from_values(values, &source.identifier)),
            Err(e) => {
                tracing::error!(source = %source.identifier, error = %e, "Extraction failed");
            }
        }
    }
    tracing::info!(count = records.len(), sources = sources.len(), "Extracted records");
    records
}
