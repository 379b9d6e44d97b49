// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - normalization passes and renderings.

pub mod date;
pub mod ingest;
pub mod location;
pub mod merge;
pub mod pipeline;
pub mod render;
pub mod staleness;
pub mod time;

pub use date::DateResolver;
pub use ingest::{Extractor, IngestError, RawResponseExtractor, ScrapeFileExtractor, Source};
pub use location::LocationResolver;
pub use merge::{MergeOutcome, RecordMerger};
pub use pipeline::Pipeline;
pub use staleness::StalenessCorrector;
pub use time::TimeRange;
