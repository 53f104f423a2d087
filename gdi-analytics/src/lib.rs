//! GDI Analytics
//!
//! Aggregation and ranking pipeline for Global Diplomacy Index post records.
//! One record per diplomatic post (embassy, consulate, high commission, ...)
//! goes in; country-year tables, rankings and network views come out.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌──────────────────────────────┐
//! │ RecordStore  │ ──▶ │ Aggregator │ ──▶ │ Classifier · Rank · Queries  │
//! │ (ingestion)  │     │ long form  │     │          │                   │
//! └──────────────┘     └────────────┘     │          ▼                   │
//!                                         │   Country Summary Builder    │
//!                                         └──────────────────────────────┘
//! ```
//!
//! Every operation is a pure function of its inputs. [`DiplomacyIndex`] wraps
//! them over an atomically replaceable snapshot and memoizes results keyed
//! by the record store fingerprint.
//!
//! # Key Rules
//!
//! - Long form groups by exact `(country, year)`; absent pairs stay absent in
//!   the wide pivot rather than becoming zero.
//! - "Embassy" + "High Commission" are embassies, "Consulate" +
//!   "Consulate General" are consulates; other labels count only toward the
//!   total.
//! - Post-count ranks use competition ranking (ties share the minimal rank).
//! - Only a missing required column is an error; everything else degrades to
//!   dropped rows or empty results.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod error;
pub mod findings;
pub mod index;
pub mod query;
pub mod rank;
pub mod record;
pub mod snapshot;
pub mod summary;

pub use aggregate::{to_long_form, to_wide_pivot, CountryYearCount, WidePivot};
pub use cache::{CacheStats, QueryCache};
pub use classify::{classify_year, PostCategory, PostTypeCounts};
pub use error::{AnalyticsError, Result};
pub use findings::{Finding, KeyFindings};
pub use index::DiplomacyIndex;
pub use query::{footprint, trend, HostCount, TrendSeries};
pub use rank::{
    competition_rank, rank_change, rank_changes, RankChangeRecord, RankChangeReport, RankRecord,
};
pub use record::{Column, DropReason, DroppedRow, IngestReport, RawPost, RawTable, RecordStore};
pub use snapshot::{Snapshot, SnapshotHandle};
pub use summary::{
    build_summary, metadata_for_year, CountryMetadata, CountrySummary, CountrySummaryTable,
};
