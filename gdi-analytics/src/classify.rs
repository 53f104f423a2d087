//! Post-type classification.
//!
//! Four labels are recognized. "Embassy" and "High Commission" count as
//! embassies; "Consulate" and "Consulate General" count as consulates. Any
//! other label still counts toward a country's total posts but toward
//! neither category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::RawPost;

/// Labels counted as embassies.
pub const EMBASSY_LABELS: [&str; 2] = ["Embassy", "High Commission"];

/// Labels counted as consulates.
pub const CONSULATE_LABELS: [&str; 2] = ["Consulate", "Consulate General"];

/// Canonical post category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    Embassy,
    Consulate,
}

impl PostCategory {
    /// Classify a literal post type label. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        if EMBASSY_LABELS.contains(&label) {
            Some(Self::Embassy)
        } else if CONSULATE_LABELS.contains(&label) {
            Some(Self::Consulate)
        } else {
            None
        }
    }
}

/// Embassy/consulate breakdown for one country in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeCounts {
    pub name: String,
    pub year: i32,
    pub embassies: u64,
    pub consulates: u64,
}

/// Count embassies and consulates per country for `year`.
///
/// Every country with at least one post that year gets an entry, even if
/// none of its posts is recognized.
pub fn classify_year(posts: &[RawPost], year: i32) -> BTreeMap<String, PostTypeCounts> {
    let mut counts: BTreeMap<String, PostTypeCounts> = BTreeMap::new();

    for post in posts.iter().filter(|p| p.year == year) {
        let entry = counts
            .entry(post.country.clone())
            .or_insert_with(|| PostTypeCounts {
                name: post.country.clone(),
                year,
                embassies: 0,
                consulates: 0,
            });

        match PostCategory::from_label(&post.post_type) {
            Some(PostCategory::Embassy) => entry.embassies += 1,
            Some(PostCategory::Consulate) => entry.consulates += 1,
            None => {}
        }
    }

    counts
}
