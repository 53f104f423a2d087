//! Per-year country summaries.
//!
//! Joins post totals, the embassy/consulate breakdown, and country metadata
//! into one row per country, ordered by overall rank.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::warn;

use crate::aggregate::CountryYearCount;
use crate::classify::PostTypeCounts;
use crate::record::RawPost;

/// Metadata describing a country in a given year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMetadata {
    pub name: String,
    pub year: i32,
    pub overall_rank: Option<u32>,
    pub population: Option<f64>,
    pub gdp: Option<f64>,
}

/// Display-ready row for one country in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    /// Overall rank, `None` when the source rank cell was unreadable
    pub rank: Option<u32>,
    pub name: String,
    pub population: Option<f64>,
    pub gdp: Option<f64>,
    pub total_posts: u64,
    pub embassies: u64,
    pub consulates: u64,
}

/// Summary rows for one year.
///
/// Rows are sorted by rank with a stable sort, unranked countries last.
/// Countries sharing a rank (or both unranked) keep the order in which their
/// metadata first appeared. Shared rank values are listed in `duplicate_ranks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountrySummaryTable {
    pub year: i32,
    pub rows: Vec<CountrySummary>,
    pub duplicate_ranks: Vec<u32>,
}

impl CountrySummaryTable {
    /// Row keyed by `rank`. With duplicates, the first row in order wins.
    pub fn get(&self, rank: u32) -> Option<&CountrySummary> {
        self.rows.iter().find(|r| r.rank == Some(rank))
    }

    /// Row for a country name.
    pub fn find(&self, name: &str) -> Option<&CountrySummary> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// True when no country has data for the year.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Extract deduplicated metadata for `year` from raw records.
///
/// The first record of each country wins; output follows first appearance.
pub fn metadata_for_year(posts: &[RawPost], year: i32) -> Vec<CountryMetadata> {
    let mut seen: HashSet<&str> = HashSet::new();
    posts
        .iter()
        .filter(|p| p.year == year)
        .filter(|p| seen.insert(p.country.as_str()))
        .map(|p| CountryMetadata {
            name: p.country.clone(),
            year,
            overall_rank: p.overall_rank,
            population: p.population,
            gdp: p.gdp,
        })
        .collect()
}

/// Build the summary for `year`.
///
/// * metadata and long form are filtered to `year`
/// * metadata is deduplicated by country, first occurrence wins
/// * countries without a post total are dropped
/// * countries without a breakdown get zero embassies and consulates
pub fn build_summary(
    year: i32,
    long_form: &[CountryYearCount],
    classified: &BTreeMap<String, PostTypeCounts>,
    metadata: &[CountryMetadata],
) -> CountrySummaryTable {
    let totals: HashMap<&str, u64> = long_form
        .iter()
        .filter(|r| r.year == year)
        .map(|r| (r.name.as_str(), r.posts))
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut rows: Vec<CountrySummary> = metadata
        .iter()
        .filter(|m| m.year == year)
        .filter(|m| seen.insert(m.name.as_str()))
        .filter_map(|m| {
            let total_posts = *totals.get(m.name.as_str())?;
            let (embassies, consulates) = classified
                .get(&m.name)
                .filter(|c| c.year == year)
                .map_or((0, 0), |c| (c.embassies, c.consulates));

            Some(CountrySummary {
                rank: m.overall_rank,
                name: m.name.clone(),
                population: m.population,
                gdp: m.gdp,
                total_posts,
                embassies,
                consulates,
            })
        })
        .collect();

    rows.sort_by_key(|r| (r.rank.is_none(), r.rank));

    let duplicate_ranks: Vec<u32> = rows
        .windows(2)
        .filter_map(|w| w[0].rank.filter(|&r| w[1].rank == Some(r)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if !duplicate_ranks.is_empty() {
        warn!(
            year,
            ranks = ?duplicate_ranks,
            "Countries share an overall rank; keeping first-seen order"
        );
    }

    CountrySummaryTable {
        year,
        rows,
        duplicate_ranks,
    }
}
