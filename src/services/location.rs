// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location completion and address helpers.
//!
//! Locations without a postal code are completed from a sibling record that
//! names the same place, or from the configured default region. Anything
//! synthesized is flagged as uncertain.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, DefaultRegion};
use crate::models::activity::normalize_key_fragment;
use crate::models::ActivityRecord;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

static RE_POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap());
static RE_STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d+\s+[A-Za-z\s]+(?:Avenue|Ave|Street|St|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln|Court|Ct|Way|Place|Pl|Circle|Cir)",
    )
    .unwrap()
});
static ADDRESS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "at Zilker Park", "located at 100 Main", "Address: 100 Main"
        r"(?i)\b(?:located at|at|address:?)\s+(.+)",
        // The part before a region and postal code
        r"(?i)(.+?),\s*(?:[A-Z]{2}|[A-Za-z]+)\s*\d{5}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Whether the text already carries a postal code.
pub fn has_postal_code(location: &str) -> bool {
    RE_POSTAL_CODE.is_match(location)
}

/// Pull a mappable address out of a free-text location.
pub fn extract_address(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    if RE_STREET_ADDRESS.is_match(location) {
        return Some(location.to_string());
    }
    let extracted = ADDRESS_PATTERNS
        .iter()
        .find_map(|re| re.captures(location))
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty());
    Some(extracted.unwrap_or_else(|| location.to_string()))
}

/// Google Maps search link for an address.
pub fn maps_search_url(address: &str) -> String {
    format!("{MAPS_SEARCH_URL}{}", urlencoding::encode(address))
}

/// Completes partial locations against a default region.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    region: DefaultRegion,
    region_name_key: String,
}

impl LocationResolver {
    pub fn new(region: DefaultRegion) -> Self {
        let region_name_key = normalize_key_fragment(&region.region_name);
        Self {
            region,
            region_name_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_region.clone())
    }

    /// Whether the location names the region by code or by name, as a
    /// whole word. Codes are matched case-sensitively ("IN" is not "in").
    fn mentions_region(&self, location: &str) -> bool {
        let code = self.region.region_code.as_str();
        if location
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == code)
        {
            return true;
        }
        if self.region_name_key.is_empty() {
            return false;
        }
        let padded = format!(" {} ", normalize_key_fragment(location));
        padded.contains(&format!(" {} ", self.region_name_key))
    }

    /// Completed location and its uncertainty flag, or `None` when the
    /// location needs nothing.
    fn completion_for(
        &self,
        location: &str,
        siblings: &[ActivityRecord],
    ) -> Option<(String, bool)> {
        if has_postal_code(location) {
            return None;
        }

        let sibling = siblings.iter().find_map(|other| {
            let other_location = other.location_text()?;
            (has_postal_code(other_location) && other_location.contains(location))
                .then(|| (other_location.to_string(), other.location_uncertain))
        });
        if let Some(adopted) = sibling {
            tracing::debug!(from = location, to = %adopted.0, "Adopted sibling location");
            return Some(adopted);
        }

        let region = &self.region;
        let completed = if self.mentions_region(location) {
            format!("{location} {}", region.postal_code)
        } else {
            format!(
                "{location}, {}, {} {}",
                region.locality, region.region_code, region.postal_code
            )
        };
        tracing::debug!(from = location, to = %completed, "Synthesized postal code");
        Some((completed, true))
    }

    /// Complete one record's location using `siblings` as evidence.
    pub fn complete_location(&self, record: &mut ActivityRecord, siblings: &[ActivityRecord]) {
        let Some(location) = record.location_text().map(str::trim) else {
            return;
        };
        if let Some((completed, uncertain)) = self.completion_for(location, siblings) {
            record.location = Some(completed);
            record.location_uncertain = uncertain;
        }
    }

    /// Complete every record in order, with the batch itself as siblings.
    ///
    /// Returns the number of locations changed.
    pub fn complete_all(&self, records: &mut [ActivityRecord]) -> usize {
        let mut changed = 0;
        for index in 0..records.len() {
            let Some(location) = records[index].location_text().map(str::trim) else {
                continue;
            };
            let Some((completed, uncertain)) = self.completion_for(location, records) else {
                continue;
            };
            let record = &mut records[index];
            record.location = Some(completed);
            record.location_uncertain = uncertain;
            changed += 1;
        }
        if changed > 0 {
            tracing::info!(changed, total = records.len(), "Completed locations");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LocationResolver {
        LocationResolver::new(DefaultRegion::default())
    }

    fn at(location: &str) -> ActivityRecord {
        ActivityRecord {
            location: Some(location.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_postal_code_detection() {
        assert!(has_postal_code("1100 Barton Springs Rd, Austin, TX 78704"));
        assert!(has_postal_code("Somewhere 78704-1234"));
        assert!(!has_postal_code("Zilker Park"));
        assert!(!has_postal_code("Suite 1234567"));
    }

    #[test]
    fn test_coded_location_untouched() {
        let mut record = at("Library, Austin, TX 78704");
        resolver().complete_location(&mut record, &[]);
        assert_eq!(record.location.as_deref(), Some("Library, Austin, TX 78704"));
        assert!(!record.location_uncertain);
    }

    #[test]
    fn test_appends_full_region_when_missing() {
        let mut record = at("Zilker Park");
        resolver().complete_location(&mut record, &[]);
        assert_eq!(
            record.location.as_deref(),
            Some("Zilker Park, Austin, TX 78701")
        );
        assert!(record.location_uncertain);
    }

    #[test]
    fn test_appends_postal_only_when_region_present() {
        let mut record = at("Mueller Lake Park, Austin, TX");
        resolver().complete_location(&mut record, &[]);
        assert_eq!(
            record.location.as_deref(),
            Some("Mueller Lake Park, Austin, TX 78701")
        );
        assert!(record.location_uncertain);

        let mut record = at("Round Rock, texas");
        resolver().complete_location(&mut record, &[]);
        assert_eq!(record.location.as_deref(), Some("Round Rock, texas 78701"));
    }

    #[test]
    fn test_region_code_must_be_whole_word() {
        let mut record = at("TXU Energy Center");
        resolver().complete_location(&mut record, &[]);
        assert_eq!(
            record.location.as_deref(),
            Some("TXU Energy Center, Austin, TX 78701")
        );
    }

    #[test]
    fn test_adopts_sibling_location() {
        let sibling = at("Central Library, 710 W Cesar Chavez St, Austin, TX 78701");
        let mut record = at("Central Library");
        resolver().complete_location(&mut record, std::slice::from_ref(&sibling));
        assert_eq!(record.location, sibling.location);
        assert!(!record.location_uncertain);
    }

    #[test]
    fn test_adopted_synthesized_code_stays_uncertain() {
        let mut records = vec![at("Zilker Park"), at("Zilker Park")];
        let changed = resolver().complete_all(&mut records);
        assert_eq!(changed, 2);
        for record in &records {
            assert_eq!(
                record.location.as_deref(),
                Some("Zilker Park, Austin, TX 78701")
            );
            assert!(record.location_uncertain);
        }
    }

    #[test]
    fn test_empty_location_left_alone() {
        let mut records = vec![ActivityRecord::default(), at("   ")];
        assert_eq!(resolver().complete_all(&mut records), 0);
        assert_eq!(records[0].location, None);
        assert!(!records[1].location_uncertain);
    }

    #[test]
    fn test_extract_address() {
        assert_eq!(
            extract_address("123 Main Street, Austin, TX 78701").as_deref(),
            Some("123 Main Street, Austin, TX 78701")
        );
        assert_eq!(
            extract_address("Story time located at Windsor Park Library").as_deref(),
            Some("Windsor Park Library")
        );
        assert_eq!(
            extract_address("Zilker Park, Austin, TX 78701").as_deref(),
            Some("Zilker Park, Austin")
        );
        assert_eq!(
            extract_address("Paramount Theatre").as_deref(),
            Some("Paramount Theatre")
        );
        assert_eq!(extract_address("  "), None);
    }

    #[test]
    fn test_maps_search_url_is_encoded() {
        assert_eq!(
            maps_search_url("Zilker Park, Austin"),
            "https://www.google.com/maps/search/?api=1&query=Zilker%20Park%2C%20Austin"
        );
    }
}
