// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Day-part buckets used to color and filter map markers.

use serde::{Deserialize, Serialize};

/// Coarse time-of-day bucket for an activity's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    /// 12 AM - 11:59 AM
    Morning,
    /// 12 PM - 4:59 PM
    Afternoon,
    /// 5 PM - 11:59 PM
    Evening,
    Unknown,
}

impl DayPart {
    /// All buckets in display order.
    pub const ALL: [DayPart; 4] = [
        DayPart::Morning,
        DayPart::Afternoon,
        DayPart::Evening,
        DayPart::Unknown,
    ];

    /// Bucket a 24-hour clock hour; anything outside 0..24 is unknown.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => DayPart::Morning,
            12..=16 => DayPart::Afternoon,
            17..=23 => DayPart::Evening,
            _ => DayPart::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
            DayPart::Unknown => "unknown",
        }
    }

    /// Legend label shown next to the marker color.
    pub fn legend(self) -> &'static str {
        match self {
            DayPart::Morning => "Morning (12 AM - 11:59 AM)",
            DayPart::Afternoon => "Afternoon (12 PM - 4:59 PM)",
            DayPart::Evening => "Evening (5 PM - 11:59 PM)",
            DayPart::Unknown => "Time unknown",
        }
    }
}

impl std::fmt::Display for DayPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
