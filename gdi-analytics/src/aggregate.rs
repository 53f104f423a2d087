//! Country-year aggregation.
//!
//! Turns per-post records into the long-form post-count table and its wide
//! pivot. Grouping uses exact, case-sensitive country names and exact years.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::record::RawPost;

/// Post count for one country in one year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryYearCount {
    pub name: String,
    pub year: i32,
    pub posts: u64,
}

/// Group records by `(country, year)` and count the posts of each group.
///
/// Output is ordered by country name, then year. Records reaching this point
/// already carry a parsed year, so every record is counted exactly once.
pub fn to_long_form(posts: &[RawPost]) -> Vec<CountryYearCount> {
    let mut groups: BTreeMap<(&str, i32), u64> = BTreeMap::new();
    for post in posts {
        *groups.entry((post.country.as_str(), post.year)).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((name, year), posts)| CountryYearCount {
            name: name.to_string(),
            year,
            posts,
        })
        .collect()
}

/// Rows of the long form that belong to `year`, in long-form order.
pub fn rows_for_year(long_form: &[CountryYearCount], year: i32) -> Vec<&CountryYearCount> {
    long_form.iter().filter(|r| r.year == year).collect()
}

// ============================================================================
// Wide Pivot
// ============================================================================

/// Country × year matrix of post counts.
///
/// Column labels are the observed years, stringified, in ascending numeric
/// order. A country with no data for a year has no cell there; absence is
/// never reported as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidePivot {
    columns: Vec<String>,
    rows: BTreeMap<String, BTreeMap<String, u64>>,
}

impl WidePivot {
    /// Year labels in ascending year order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Country names in ascending order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Cell for `country` under the year label `year`.
    pub fn get(&self, country: &str, year: &str) -> Option<u64> {
        self.rows.get(country)?.get(year).copied()
    }

    /// All cells present for `country`, keyed by year label.
    pub fn row(&self, country: &str) -> Option<&BTreeMap<String, u64>> {
        self.rows.get(country)
    }

    /// Number of countries.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the pivot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Re-key the long form as country → year label → posts.
pub fn to_wide_pivot(long_form: &[CountryYearCount]) -> WidePivot {
    let years: BTreeSet<i32> = long_form.iter().map(|r| r.year).collect();
    let columns = years.iter().map(|y| y.to_string()).collect();

    let mut rows: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for record in long_form {
        rows.entry(record.name.clone())
            .or_default()
            .insert(record.year.to_string(), record.posts);
    }

    WidePivot { columns, rows }
}
