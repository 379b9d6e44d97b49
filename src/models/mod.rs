// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod day_part;
pub mod marker;

pub use activity::{ActivityRecord, IdentityKey, TimeValue};
pub use day_part::DayPart;
pub use marker::MarkerCategory;
