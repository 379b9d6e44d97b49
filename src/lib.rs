// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity Locator: normalize extracted kids' activity listings
//!
//! This crate turns loosely structured activity records (from flyer images
//! read by a vision model, or from scraped event pages) into a canonical,
//! deduplicated set with ISO dates, day-part buckets and complete locations,
//! and renders that set as Markdown and as a map marker feed.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
