//! Diplomacy index facade.
//!
//! [`DiplomacyIndex`] serves every query over the current snapshot and
//! memoizes results per snapshot. Queries are reentrant and may run from
//! many threads while [`DiplomacyIndex::reload`] swaps in new data.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use gdi_common::config::AnalyticsConfig;
use gdi_common::Validate;

use crate::aggregate::{to_wide_pivot, CountryYearCount, WidePivot};
use crate::cache::{CacheStats, QueryCache};
use crate::classify::classify_year;
use crate::error::Result;
use crate::findings::{self, KeyFindings};
use crate::query::{self, HostCount, TrendSeries};
use crate::rank::{self, RankChangeReport};
use crate::record::{IngestReport, RawTable, RecordStore};
use crate::snapshot::{Snapshot, SnapshotHandle};
use crate::summary::{build_summary, metadata_for_year, CountrySummaryTable};

type TrendKey = (Vec<String>, Vec<i32>);

/// Query service over an atomically replaceable record snapshot.
#[derive(Debug)]
pub struct DiplomacyIndex {
    config: AnalyticsConfig,
    snapshot: SnapshotHandle,
    pivot_cache: QueryCache<(), WidePivot>,
    summary_cache: QueryCache<i32, CountrySummaryTable>,
    rank_cache: QueryCache<(i32, i32, usize), RankChangeReport>,
    footprint_cache: QueryCache<(String, i32), Vec<HostCount>>,
    trend_cache: QueryCache<TrendKey, TrendSeries>,
}

impl DiplomacyIndex {
    /// Create an index over `store`. Fails if `config` does not validate.
    pub fn new(store: RecordStore, config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.cache_capacity;

        info!(
            records = store.len(),
            cache_capacity = capacity,
            "Diplomacy index created"
        );

        Ok(Self {
            config,
            snapshot: SnapshotHandle::new(store),
            pivot_cache: QueryCache::new("wide_pivot", capacity),
            summary_cache: QueryCache::new("summary", capacity),
            rank_cache: QueryCache::new("rank_change", capacity),
            footprint_cache: QueryCache::new("footprint", capacity),
            trend_cache: QueryCache::new("trend", capacity),
        })
    }

    /// Ingest `table` and create an index over it.
    pub fn from_table(table: &RawTable, config: AnalyticsConfig) -> Result<(Self, IngestReport)> {
        let (store, report) = RecordStore::ingest(table)?;
        Ok((Self::new(store, config)?, report))
    }

    /// Swap in a new record store and drop memoized results.
    pub fn reload(&self, store: RecordStore) -> Arc<Snapshot> {
        let snapshot = self.snapshot.replace(store);
        self.clear_caches();
        snapshot
    }

    /// Ingest `table` and swap it in. On a schema error the current data stays.
    pub fn reload_table(&self, table: &RawTable) -> Result<IngestReport> {
        let (store, report) = RecordStore::ingest(table)?;
        self.reload(store);
        Ok(report)
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load()
    }

    /// Active configuration.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    // ========================================================================
    // Core Queries
    // ========================================================================

    /// Long-form country-year post counts.
    pub fn long_form(&self) -> Arc<Vec<CountryYearCount>> {
        Arc::clone(self.snapshot().long_form())
    }

    /// Country × year pivot of the long form.
    pub fn wide_pivot(&self) -> Arc<WidePivot> {
        let snap = self.snapshot();
        self.pivot_cache
            .get_or_compute(snap.fingerprint(), &(), || to_wide_pivot(snap.long_form()))
    }

    /// Country summary rows for `year`, ordered by overall rank.
    pub fn summary(&self, year: i32) -> Arc<CountrySummaryTable> {
        let snap = self.snapshot();
        self.summary_cache.get_or_compute(snap.fingerprint(), &year, || {
            let posts = snap.store().posts();
            let classified = classify_year(posts, year);
            let metadata = metadata_for_year(posts, year);
            let table = build_summary(year, snap.long_form(), &classified, &metadata);
            debug!(year, rows = table.rows.len(), "Built country summary");
            table
        })
    }

    /// Largest rank movers between two years, using the configured list length.
    pub fn rank_change(&self, start_year: i32, end_year: i32) -> Arc<RankChangeReport> {
        self.rank_change_top(start_year, end_year, self.config.rank_change_top_n)
    }

    /// Largest rank movers between two years, `top_n` per direction.
    pub fn rank_change_top(
        &self,
        start_year: i32,
        end_year: i32,
        top_n: usize,
    ) -> Arc<RankChangeReport> {
        let snap = self.snapshot();
        self.rank_cache
            .get_or_compute(snap.fingerprint(), &(start_year, end_year, top_n), || {
                rank::rank_change(snap.long_form(), start_year, end_year, top_n)
            })
    }

    /// Host-country footprint of `home_country` in `year`.
    pub fn footprint(&self, home_country: &str, year: i32) -> Arc<Vec<HostCount>> {
        let snap = self.snapshot();
        let key = (home_country.to_string(), year);
        self.footprint_cache.get_or_compute(snap.fingerprint(), &key, || {
            query::footprint(snap.store().posts(), home_country, year)
        })
    }

    /// Time series for `countries`, skipping the configured excluded years.
    pub fn trend(&self, countries: &BTreeSet<String>) -> Arc<TrendSeries> {
        let excluded: BTreeSet<i32> = self.config.trend_excluded_years.iter().copied().collect();
        self.trend_excluding(countries, &excluded)
    }

    /// Time series for `countries`, skipping `exclude_years`.
    pub fn trend_excluding(
        &self,
        countries: &BTreeSet<String>,
        exclude_years: &BTreeSet<i32>,
    ) -> Arc<TrendSeries> {
        let snap = self.snapshot();
        let key: TrendKey = (
            countries.iter().cloned().collect(),
            exclude_years.iter().copied().collect(),
        );
        self.trend_cache.get_or_compute(snap.fingerprint(), &key, || {
            query::trend(snap.long_form(), countries, exclude_years)
        })
    }

    // ========================================================================
    // Selection Helpers
    // ========================================================================

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.snapshot().store().years()
    }

    /// Most recent year with data.
    pub fn latest_year(&self) -> Option<i32> {
        self.snapshot().store().latest_year()
    }

    /// Sorted country names, optionally for one year.
    pub fn countries(&self, year: Option<i32>) -> Vec<String> {
        self.snapshot().store().countries(year)
    }

    /// Leader and runner-up of the latest year.
    pub fn key_findings(&self) -> Option<KeyFindings> {
        let snap = self.snapshot();
        findings::key_findings(snap.store().posts(), snap.long_form())
    }

    /// Configured comparison countries that exist in the data.
    pub fn comparison_defaults(&self) -> Vec<String> {
        let snap = self.snapshot();
        findings::resolve_comparison_defaults(
            snap.long_form(),
            &self.config.default_comparison_countries,
        )
    }

    /// Home country to show first for `year`.
    pub fn default_home_country(&self, year: i32) -> Option<String> {
        let snap = self.snapshot();
        findings::resolve_home_country(
            snap.store().posts(),
            year,
            &self.config.default_home_country,
        )
    }

    // ========================================================================
    // Cache Management
    // ========================================================================

    /// Drop every memoized result.
    pub fn clear_caches(&self) {
        self.pivot_cache.clear();
        self.summary_cache.clear();
        self.rank_cache.clear();
        self.footprint_cache.clear();
        self.trend_cache.clear();
    }

    /// Counters per cache, keyed by cache name.
    pub fn cache_stats(&self) -> BTreeMap<&'static str, CacheStats> {
        [
            (self.pivot_cache.name(), self.pivot_cache.stats()),
            (self.summary_cache.name(), self.summary_cache.stats()),
            (self.rank_cache.name(), self.rank_cache.stats()),
            (self.footprint_cache.name(), self.footprint_cache.stats()),
            (self.trend_cache.name(), self.trend_cache.stats()),
        ]
        .into_iter()
        .collect()
    }
}
