//! Post-count ranking and rank movement between years.
//!
//! Ranks use competition ("min") ranking over posts, descending: tied
//! countries share the best position of their group and the next rank skips
//! accordingly (10, 8, 8, 5 → 1, 2, 2, 4).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::aggregate::{rows_for_year, CountryYearCount};

/// A country's post-count rank within one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    pub name: String,
    pub rank: u32,
}

/// Rank movement of one country between two years.
///
/// `rank_change = rank_at_start - rank_at_end`; positive means the country
/// moved toward rank 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChangeRecord {
    pub name: String,
    pub rank_at_start: u32,
    pub rank_at_end: u32,
    pub rank_change: i64,
}

/// Largest movers in both directions between two years.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChangeReport {
    pub start_year: i32,
    pub end_year: i32,
    /// Highest `rank_change` first
    pub most_improved: Vec<RankChangeRecord>,
    /// Lowest `rank_change` first
    pub biggest_fall: Vec<RankChangeRecord>,
}

/// Rank every country present in `year`, in long-form order.
pub fn competition_rank(long_form: &[CountryYearCount], year: i32) -> Vec<RankRecord> {
    let rows = rows_for_year(long_form, year);

    let mut sorted: Vec<u64> = rows.iter().map(|r| r.posts).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    rows.iter()
        .map(|r| {
            let better = sorted.partition_point(|&p| p > r.posts);
            RankRecord {
                name: r.name.clone(),
                rank: better as u32 + 1,
            }
        })
        .collect()
}

/// Rank movement for every country present in both years.
///
/// Countries missing from either year are left out. Output follows the
/// start year's order.
pub fn rank_changes(
    long_form: &[CountryYearCount],
    start_year: i32,
    end_year: i32,
) -> Vec<RankChangeRecord> {
    let start = competition_rank(long_form, start_year);
    let end: HashMap<String, u32> = competition_rank(long_form, end_year)
        .into_iter()
        .map(|r| (r.name, r.rank))
        .collect();

    start
        .into_iter()
        .filter_map(|s| {
            let rank_at_end = *end.get(&s.name)?;
            Some(RankChangeRecord {
                rank_change: i64::from(s.rank) - i64::from(rank_at_end),
                name: s.name,
                rank_at_start: s.rank,
                rank_at_end,
            })
        })
        .collect()
}

/// Top `top_n` improvers and decliners between `start_year` and `end_year`.
///
/// Both lists use stable sorts, so equal changes keep start-year order.
/// Identical years are valid and produce all-zero changes.
pub fn rank_change(
    long_form: &[CountryYearCount],
    start_year: i32,
    end_year: i32,
    top_n: usize,
) -> RankChangeReport {
    let changes = rank_changes(long_form, start_year, end_year);

    let mut most_improved = changes.clone();
    most_improved.sort_by(|a, b| b.rank_change.cmp(&a.rank_change));
    most_improved.truncate(top_n);

    let mut biggest_fall = changes;
    biggest_fall.sort_by_key(|r| r.rank_change);
    biggest_fall.truncate(top_n);

    debug!(
        start_year,
        end_year,
        improved = most_improved.len(),
        fallen = biggest_fall.len(),
        "Computed rank change"
    );

    RankChangeReport {
        start_year,
        end_year,
        most_improved,
        biggest_fall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, year: i32, posts: u64) -> CountryYearCount {
        CountryYearCount {
            name: name.into(),
            year,
            posts,
        }
    }

    fn ranks(records: &[RankRecord]) -> Vec<(&str, u32)> {
        records.iter().map(|r| (r.name.as_str(), r.rank)).collect()
    }

    fn names(records: &[RankChangeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_competition_rank_ties_share_min_rank() {
        let long = vec![
            row("A", 2020, 8),
            row("B", 2020, 10),
            row("C", 2020, 8),
            row("D", 2020, 5),
            row("E", 2021, 99),
        ];
        assert_eq!(
            ranks(&competition_rank(&long, 2020)),
            vec![("A", 2), ("B", 1), ("C", 2), ("D", 4)]
        );
    }

    #[test]
    fn test_competition_rank_all_tied() {
        let long = vec![row("A", 2020, 3), row("B", 2020, 3), row("C", 2020, 3)];
        assert!(competition_rank(&long, 2020).iter().all(|r| r.rank == 1));
    }

    #[test]
    fn test_competition_rank_unknown_year() {
        assert!(competition_rank(&[row("A", 2020, 1)], 2030).is_empty());
    }

    #[test]
    fn test_two_country_swap() {
        let long = vec![
            row("A", 2020, 5),
            row("A", 2021, 3),
            row("B", 2020, 2),
            row("B", 2021, 6),
        ];

        let report = rank_change(&long, 2020, 2021, 10);
        assert_eq!(names(&report.most_improved), vec!["B", "A"]);
        assert_eq!(names(&report.biggest_fall), vec!["A", "B"]);
        assert_eq!(report.most_improved[0].rank_change, 1);
        assert_eq!(report.most_improved[0].rank_at_start, 2);
        assert_eq!(report.most_improved[0].rank_at_end, 1);
        assert_eq!(report.biggest_fall[0].rank_change, -1);
    }

    #[test]
    fn test_countries_missing_from_a_year_are_dropped() {
        let long = vec![
            row("A", 2020, 5),
            row("A", 2021, 3),
            row("Gone", 2020, 9),
            row("New", 2021, 9),
        ];
        let changes = rank_changes(&long, 2020, 2021);
        assert_eq!(names(&changes), vec!["A"]);
        assert_eq!(changes[0].rank_at_start, 2);
        assert_eq!(changes[0].rank_at_end, 2);
    }

    #[test]
    fn test_same_year_gives_zero_changes_truncated_to_top_n() {
        let long: Vec<CountryYearCount> = (0..12)
            .map(|i| row(&format!("C{:02}", i), 2020, i as u64))
            .collect();

        let report = rank_change(&long, 2020, 2020, 10);
        assert_eq!(report.most_improved.len(), 10);
        assert_eq!(report.biggest_fall.len(), 10);
        assert!(report.most_improved.iter().all(|r| r.rank_change == 0));
        assert!(report.biggest_fall.iter().all(|r| r.rank_change == 0));
        // stable: zero changes keep long-form order
        assert_eq!(report.most_improved[0].name, "C00");
        assert_eq!(report.biggest_fall[9].name, "C09");
    }

    #[test]
    fn test_equal_changes_keep_start_year_order() {
        let long = vec![
            row("P", 2020, 1),
            row("Q", 2020, 2),
            row("R", 2020, 3),
            row("P", 2021, 3),
            row("Q", 2021, 2),
            row("R", 2021, 1),
        ];
        // P: 3 -> 1 (+2), Q: 2 -> 2 (0), R: 1 -> 3 (-2)
        let report = rank_change(&long, 2020, 2021, 2);
        assert_eq!(names(&report.most_improved), vec!["P", "Q"]);
        assert_eq!(names(&report.biggest_fall), vec!["R", "Q"]);
    }

    #[test]
    fn test_swapping_years_flips_sign() {
        let long = vec![
            row("A", 2018, 4),
            row("B", 2018, 9),
            row("C", 2018, 4),
            row("A", 2022, 10),
            row("B", 2022, 1),
            row("C", 2022, 3),
        ];
        let forward = rank_changes(&long, 2018, 2022);
        let backward: HashMap<String, i64> = rank_changes(&long, 2022, 2018)
            .into_iter()
            .map(|r| (r.name, r.rank_change))
            .collect();

        for r in forward {
            assert_eq!(r.rank_change, -backward[&r.name]);
        }
    }
}
