//! Headline findings and selection defaults.
//!
//! Helpers a presentation layer uses to open on sensible values: the latest
//! year's leading countries, which configured comparison countries exist, and
//! which home country to show first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::aggregate::{rows_for_year, CountryYearCount};
use crate::record::RawPost;
use crate::summary::metadata_for_year;

/// One headline country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    /// Overall index rank, when the country has metadata that year
    pub overall_rank: Option<u32>,
    pub posts: u64,
}

/// The two countries with the most posts in the latest year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFindings {
    pub year: i32,
    pub leader: Option<Finding>,
    pub runner_up: Option<Finding>,
}

/// Leader and runner-up by posts in the latest year of the long form.
///
/// Equal post counts keep long-form order. Returns `None` when there is no
/// data at all.
pub fn key_findings(posts: &[RawPost], long_form: &[CountryYearCount]) -> Option<KeyFindings> {
    let year = long_form.iter().map(|r| r.year).max()?;

    let mut top = rows_for_year(long_form, year);
    top.sort_by(|a, b| b.posts.cmp(&a.posts));

    let metadata = metadata_for_year(posts, year);
    let finding = |row: &CountryYearCount| Finding {
        name: row.name.clone(),
        overall_rank: metadata
            .iter()
            .find(|m| m.name == row.name)
            .and_then(|m| m.overall_rank),
        posts: row.posts,
    };

    Some(KeyFindings {
        year,
        leader: top.first().map(|r| finding(*r)),
        runner_up: top.get(1).map(|r| finding(*r)),
    })
}

/// The `defaults` that appear in the long form, in the given order.
pub fn resolve_comparison_defaults(
    long_form: &[CountryYearCount],
    defaults: &[String],
) -> Vec<String> {
    let available: BTreeSet<&str> = long_form.iter().map(|r| r.name.as_str()).collect();
    defaults
        .iter()
        .filter(|c| available.contains(c.as_str()))
        .cloned()
        .collect()
}

/// `preferred` if it has posts in `year`, else the alphabetically first
/// country of that year, else `None`.
pub fn resolve_home_country(posts: &[RawPost], year: i32, preferred: &str) -> Option<String> {
    let countries: BTreeSet<&str> = posts
        .iter()
        .filter(|p| p.year == year)
        .map(|p| p.country.as_str())
        .collect();

    if countries.contains(preferred) {
        Some(preferred.to_string())
    } else {
        countries.iter().next().map(|c| c.to_string())
    }
}
