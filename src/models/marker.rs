// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Map marker categories and their pin colors.

use crate::models::DayPart;

/// Pin color for overlay points of interest.
pub const OVERLAY_COLOR: &str = "#8E44AD";

/// What a marker on the map represents.
///
/// Activities are colored by day-part; a deployment may overlay one extra
/// non-temporal category (e.g. libraries) with its own color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerCategory {
    DayPart(DayPart),
    Overlay(String),
}

impl MarkerCategory {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerCategory::DayPart(DayPart::Morning) => "#4285F4",
            MarkerCategory::DayPart(DayPart::Afternoon) => "#FBBC05",
            MarkerCategory::DayPart(DayPart::Evening) => "#34A853",
            MarkerCategory::DayPart(DayPart::Unknown) => "#EA4335",
            MarkerCategory::Overlay(_) => OVERLAY_COLOR,
        }
    }

    /// Filter value used by the map page's checkboxes.
    pub fn filter_value(&self) -> &str {
        match self {
            MarkerCategory::DayPart(part) => part.as_str(),
            MarkerCategory::Overlay(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MarkerCategory::DayPart(part) => part.legend(),
            MarkerCategory::Overlay(name) => name,
        }
    }
}

impl From<DayPart> for MarkerCategory {
    fn from(part: DayPart) -> Self {
        MarkerCategory::DayPart(part)
    }
}
