//! Read-side network and trend queries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::aggregate::CountryYearCount;
use crate::record::RawPost;

/// Number of posts a home country keeps in one host country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCount {
    pub host_country: String,
    pub count: u64,
}

/// Year → country → posts, for time-series display.
pub type TrendSeries = BTreeMap<i32, BTreeMap<String, u64>>;

/// Host countries where `home_country` kept posts in `year`, busiest first.
///
/// Equal counts keep first-appearance order. Records without a host country
/// are not counted.
pub fn footprint(posts: &[RawPost], home_country: &str, year: i32) -> Vec<HostCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<HostCount> = Vec::new();

    for post in posts
        .iter()
        .filter(|p| p.year == year && p.country == home_country && !p.host_country.is_empty())
    {
        match positions.get(post.host_country.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                positions.insert(post.host_country.as_str(), counts.len());
                counts.push(HostCount {
                    host_country: post.host_country.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Posts per year for the requested countries, skipping `exclude_years`.
///
/// A country with no data in a year is simply absent from that year's map;
/// a year with no matching country is absent altogether.
pub fn trend(
    long_form: &[CountryYearCount],
    countries: &BTreeSet<String>,
    exclude_years: &BTreeSet<i32>,
) -> TrendSeries {
    let mut series = TrendSeries::new();
    for record in long_form
        .iter()
        .filter(|r| countries.contains(&r.name) && !exclude_years.contains(&r.year))
    {
        series
            .entry(record.year)
            .or_default()
            .insert(record.name.clone(), record.posts);
    }
    series
}
