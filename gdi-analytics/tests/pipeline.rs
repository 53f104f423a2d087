//! End-to-end tests: spreadsheet-shaped table in, every view out.

use serde_json::{json, Value};
use std::collections::BTreeSet;

use gdi_analytics::{AnalyticsError, Column, DiplomacyIndex, RawTable, RecordStore};
use gdi_common::config::AnalyticsConfig;

fn headers() -> Vec<String> {
    Column::ALL.iter().map(|c| c.header().to_string()).collect()
}

fn row(country: &str, year: i32, post_type: &str, host: &str, rank: u32) -> Vec<Value> {
    vec![
        json!(country),
        json!(year),
        json!(rank),
        json!(post_type),
        json!(host),
        json!(10.5),
        json!(250.0),
    ]
}

/// A: 5 posts in 2020, 3 in 2021. B: 2 in 2020, 6 in 2021.
fn two_country_table() -> RawTable {
    let mut rows = Vec::new();
    rows.extend((0..5).map(|_| row("A", 2020, "Embassy", "Chile", 1)));
    rows.extend((0..3).map(|_| row("A", 2021, "Embassy", "Chile", 2)));
    rows.extend((0..2).map(|_| row("B", 2020, "Consulate", "Peru", 2)));
    rows.extend((0..6).map(|_| row("B", 2021, "Consulate", "Peru", 1)));
    RawTable::new(headers(), rows)
}

fn index_for(table: &RawTable) -> DiplomacyIndex {
    let (index, _) =
        DiplomacyIndex::from_table(table, AnalyticsConfig::default()).expect("valid table");
    index
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn long_form_and_rank_change_for_two_countries() {
    let (index, report) =
        DiplomacyIndex::from_table(&two_country_table(), AnalyticsConfig::default())
            .expect("valid table");
    assert!(report.is_clean());

    let long: Vec<(String, i32, u64)> = index
        .long_form()
        .iter()
        .map(|r| (r.name.clone(), r.year, r.posts))
        .collect();
    assert_eq!(
        long,
        vec![
            ("A".to_string(), 2020, 5),
            ("A".to_string(), 2021, 3),
            ("B".to_string(), 2020, 2),
            ("B".to_string(), 2021, 6),
        ]
    );

    let report = index.rank_change(2020, 2021);
    let a = report.biggest_fall.first().expect("A fell");
    assert_eq!(
        (a.name.as_str(), a.rank_at_start, a.rank_at_end, a.rank_change),
        ("A", 1, 2, -1)
    );
    let b = report.most_improved.first().expect("B improved");
    assert_eq!(
        (b.name.as_str(), b.rank_at_start, b.rank_at_end, b.rank_change),
        ("B", 2, 1, 1)
    );
}

#[test]
fn summary_counts_unrecognized_post_types_only_in_total() {
    let rows = vec![
        row("C", 2020, "Embassy", "Togo", 7),
        row("C", 2020, "Consulate General", "Togo", 7),
        row("C", 2020, "Trade Office", "Benin", 7),
    ];
    let index = index_for(&RawTable::new(headers(), rows));

    let summary = index.summary(2020);
    let c = summary.get(7).expect("rank 7 row");
    assert_eq!(c.name, "C");
    assert_eq!(c.total_posts, 3);
    assert_eq!(c.embassies, 1);
    assert_eq!(c.consulates, 1);
    assert_eq!(c.population, Some(10.5));
    assert_eq!(c.gdp, Some(250.0));
}

#[test]
fn trend_skips_excluded_year() {
    let mut rows = Vec::new();
    for year in 2018..=2021 {
        rows.push(row("A", year, "Embassy", "Iran", 1));
        rows.push(row("B", year, "Embassy", "Iraq", 2));
    }
    rows.push(row("C", 2020, "Embassy", "Iraq", 3));

    let index = index_for(&RawTable::new(headers(), rows));

    let series = index.trend(&set(&["A", "B"]));
    assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![2018, 2020, 2021]);
    for countries in series.values() {
        assert_eq!(countries.keys().cloned().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}

#[test]
fn footprint_for_home_country() {
    let rows = vec![
        row("China", 2023, "Embassy", "Kenya", 1),
        row("China", 2023, "Consulate", "India", 1),
        row("China", 2023, "Consulate General", "India", 1),
        row("Japan", 2023, "Embassy", "India", 2),
    ];
    let index = index_for(&RawTable::new(headers(), rows));

    let home = index.default_home_country(2023).expect("home country");
    assert_eq!(home, "China");

    let fp = index.footprint(&home, 2023);
    assert_eq!(fp.len(), 2);
    assert_eq!(fp[0].host_country, "India");
    assert_eq!(fp[0].count, 2);
    assert!(index.footprint("Nowhere", 2023).is_empty());
}

#[test]
fn missing_required_column_is_fatal() {
    let table = RawTable::new(
        vec!["COUNTRY".into(), "Year".into()],
        vec![vec![json!("A"), json!(2020)]],
    );
    let err = DiplomacyIndex::from_table(&table, AnalyticsConfig::default()).unwrap_err();
    match &err {
        AnalyticsError::Schema { missing } => assert_eq!(missing, &["OVERALL RANK"]),
        other => panic!("expected schema error, got {:?}", other),
    }

    let common: gdi_common::Error = err.into();
    assert!(common.is_fatal());
}

#[test]
fn dropped_rows_do_not_reach_the_long_form() {
    let mut table = two_country_table();
    table.rows.push(vec![json!("A"), json!("unknown"), json!(1)]);
    table.rows.push(vec![json!(""), json!(2020), json!(1)]);
    table.rows.push(vec![json!("A"), json!(2021), json!("n/a")]);

    let (store, report) = RecordStore::ingest(&table).expect("valid schema");
    assert_eq!(report.dropped_count(), 2);
    assert_eq!(report.accepted, 17);

    let index = DiplomacyIndex::new(store, AnalyticsConfig::default()).expect("valid config");
    let total: u64 = index.long_form().iter().map(|r| r.posts).sum();
    assert_eq!(total, 17);
}

#[test]
fn unknown_selections_give_empty_results() {
    let index = index_for(&two_country_table());

    assert!(index.summary(1999).is_empty());
    assert!(index.rank_change(1999, 2021).most_improved.is_empty());
    assert!(index.trend(&set(&["Atlantis"])).is_empty());
    assert!(index.countries(Some(1999)).is_empty());
}

#[test]
fn wide_pivot_distinguishes_missing_from_zero() {
    let mut table = two_country_table();
    table.rows.push(row("Late", 2021, "Embassy", "Mali", 3));

    let index = index_for(&table);
    let pivot = index.wide_pivot();
    assert_eq!(pivot.columns(), ["2020", "2021"]);
    assert_eq!(pivot.get("Late", "2021"), Some(1));
    assert_eq!(pivot.get("Late", "2020"), None);
}

#[test]
fn unreadable_rank_still_counts_the_post() {
    let mut rows = vec![row("Chad", 2020, "Embassy", "Mali", 40)];
    let mut unranked = row("Chad", 2020, "Embassy", "Niger", 40);
    unranked[2] = json!(null);
    rows.push(unranked);
    let mut garbled = row("Chad", 2020, "Consulate", "Niger", 40);
    garbled[2] = json!("n/a");
    rows.push(garbled);

    let (index, report) =
        DiplomacyIndex::from_table(&RawTable::new(headers(), rows), AnalyticsConfig::default())
            .expect("valid table");
    assert!(report.is_clean());

    assert_eq!(index.long_form()[0].posts, 3);
    let fp = index.footprint("Chad", 2020);
    assert_eq!(fp[0].host_country, "Niger");
    assert_eq!(fp[0].count, 2);

    let summary = index.summary(2020);
    let chad = summary.find("Chad").expect("Chad row");
    assert_eq!(chad.rank, Some(40));
    assert_eq!(chad.total_posts, 3);
    assert_eq!((chad.embassies, chad.consulates), (2, 1));
}
