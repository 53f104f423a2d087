//! Record store: validated, immutable per-post records.
//!
//! Records enter either already typed ([`RecordStore::from_posts`]) or as a
//! parsed spreadsheet table ([`RecordStore::ingest`]). Table ingestion checks
//! the header once, then coerces every row, dropping rows whose grouping
//! cells (country, year) cannot be read and reporting each drop. Unreadable
//! metadata cells become `None` and the post is kept.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};
use xxhash_rust::xxh3::Xxh3;

use crate::error::{AnalyticsError, Result};

// ============================================================================
// Raw Post
// ============================================================================

/// One diplomatic posting maintained by `country` in `host_country`.
///
/// `overall_rank`, `population` and `gdp` describe the country-year rather
/// than the post, so they repeat across every post of that country-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    /// Sending country
    pub country: String,
    /// Index year
    pub year: i32,
    /// Literal post type label ("Embassy", "Consulate General", ...)
    pub post_type: String,
    /// Country hosting the post
    pub host_country: String,
    /// Overall index rank of the sending country for this year, if readable
    pub overall_rank: Option<u32>,
    /// Population in millions
    pub population: Option<f64>,
    /// GDP in billions of USD
    pub gdp: Option<f64>,
}

// ============================================================================
// Raw Table
// ============================================================================

/// Columns understood by table ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Country,
    Year,
    OverallRank,
    PostType,
    HostCountry,
    Population,
    Gdp,
}

impl Column {
    /// Columns whose absence makes a table unusable.
    pub const REQUIRED: [Column; 3] = [Column::Country, Column::Year, Column::OverallRank];

    /// Every recognized column.
    pub const ALL: [Column; 7] = [
        Column::Country,
        Column::Year,
        Column::OverallRank,
        Column::PostType,
        Column::HostCountry,
        Column::Population,
        Column::Gdp,
    ];

    /// Header label as it appears in the source spreadsheet. Matching is exact.
    pub const fn header(self) -> &'static str {
        match self {
            Self::Country => "COUNTRY",
            Self::Year => "Year",
            Self::OverallRank => "OVERALL RANK",
            Self::PostType => "POST TYPE TITLE",
            Self::HostCountry => "POST COUNTRY",
            Self::Population => "POPULATION (M)",
            Self::Gdp => "GDP (B, USD)",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// A parsed spreadsheet: a header row plus rows of scalar cells.
///
/// Rows shorter than the header are padded with nulls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Create a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    /// Map each recognized column to its position. First occurrence wins.
    fn column_index(&self) -> HashMap<Column, usize> {
        let mut index = HashMap::new();
        for column in Column::ALL {
            if let Some(pos) = self.headers.iter().position(|h| h == column.header()) {
                index.insert(column, pos);
            }
        }
        index
    }

    /// Check that every required column is present.
    pub fn check_schema(&self) -> Result<()> {
        let index = self.column_index();
        let missing: Vec<String> = Column::REQUIRED
            .iter()
            .filter(|c| !index.contains_key(c))
            .map(|c| c.header().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyticsError::Schema { missing })
        }
    }
}

// ============================================================================
// Ingestion Report
// ============================================================================

/// Why a row was left out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DropReason {
    /// Country cell empty or null
    MissingCountry,
    /// Year cell absent or not an integer
    InvalidYear(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCountry => write!(f, "missing country"),
            Self::InvalidYear(v) => write!(f, "invalid year {}", v),
        }
    }
}

/// A row dropped during numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// Zero-based row position in the source table (header excluded)
    pub row: usize,
    pub reason: DropReason,
}

/// Outcome of table ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Rows turned into records
    pub accepted: usize,
    /// Rows left out, in table order
    pub dropped: Vec<DroppedRow>,
}

impl IngestReport {
    /// Number of dropped rows.
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// True when every row was accepted.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

// ============================================================================
// Cell Coercion
// ============================================================================

/// Read an integer cell. Accepts integral floats (`2020.0`) and numeric strings.
pub(crate) fn coerce_int(cell: &Value) -> Option<i64> {
    match cell {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Read a float cell. Non-finite values count as missing.
pub(crate) fn coerce_float(cell: &Value) -> Option<f64> {
    let v = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    v.is_finite().then_some(v)
}

/// Read a text cell. Null becomes the empty string.
pub(crate) fn coerce_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn describe(cell: &Value) -> String {
    match cell {
        Value::Null => "<empty>".to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Record Store
// ============================================================================

/// Immutable collection of validated post records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    posts: Vec<RawPost>,
    fingerprint: u64,
}

impl RecordStore {
    /// Build a store from typed records.
    pub fn from_posts(posts: Vec<RawPost>) -> Self {
        let fingerprint = fingerprint(&posts);
        Self { posts, fingerprint }
    }

    /// Build a store from a parsed table.
    ///
    /// Fails only when a required column is missing. Rows with an empty
    /// country or an unreadable year are dropped and listed in the returned
    /// report. An unreadable rank leaves `overall_rank` empty.
    pub fn ingest(table: &RawTable) -> Result<(Self, IngestReport)> {
        table.check_schema()?;
        let index = table.column_index();

        let mut posts = Vec::with_capacity(table.rows.len());
        let mut report = IngestReport::default();

        for (row_no, row) in table.rows.iter().enumerate() {
            match coerce_row(row, &index) {
                Ok(post) => posts.push(post),
                Err(reason) => {
                    debug!(row = row_no, reason = %reason, "Dropping malformed row");
                    report.dropped.push(DroppedRow {
                        row: row_no,
                        reason,
                    });
                }
            }
        }

        report.accepted = posts.len();
        let store = Self::from_posts(posts);

        info!(
            accepted = report.accepted,
            dropped = report.dropped_count(),
            fingerprint = store.fingerprint,
            "Ingested post records"
        );

        Ok((store, report))
    }

    /// All records in ingestion order.
    pub fn posts(&self) -> &[RawPost] {
        &self.posts
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// True when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Content hash identifying this store for memoization.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.posts
            .iter()
            .map(|p| p.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Most recent year, if any.
    pub fn latest_year(&self) -> Option<i32> {
        self.posts.iter().map(|p| p.year).max()
    }

    /// Distinct country names, sorted, optionally restricted to one year.
    pub fn countries(&self, year: Option<i32>) -> Vec<String> {
        self.posts
            .iter()
            .filter(|p| year.map_or(true, |y| p.year == y))
            .map(|p| p.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

static NULL: Value = Value::Null;

fn row_cell<'a>(row: &'a [Value], index: &HashMap<Column, usize>, column: Column) -> &'a Value {
    index
        .get(&column)
        .and_then(|&pos| row.get(pos))
        .unwrap_or(&NULL)
}

fn coerce_row(
    row: &[Value],
    index: &HashMap<Column, usize>,
) -> std::result::Result<RawPost, DropReason> {
    let cell = |column: Column| row_cell(row, index, column);

    let country = coerce_text(cell(Column::Country));
    if country.is_empty() {
        return Err(DropReason::MissingCountry);
    }

    let year_cell = cell(Column::Year);
    let year = coerce_int(year_cell)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| DropReason::InvalidYear(describe(year_cell)))?;

    let overall_rank =
        coerce_int(cell(Column::OverallRank)).and_then(|r| u32::try_from(r).ok());

    Ok(RawPost {
        country,
        year,
        post_type: coerce_text(cell(Column::PostType)),
        host_country: coerce_text(cell(Column::HostCountry)),
        overall_rank,
        population: coerce_float(cell(Column::Population)),
        gdp: coerce_float(cell(Column::Gdp)),
    })
}

/// Hash the canonical encoding of every record, order included.
fn fingerprint(posts: &[RawPost]) -> u64 {
    fn put_str(hasher: &mut Xxh3, s: &str) {
        hasher.update(&(s.len() as u64).to_le_bytes());
        hasher.update(s.as_bytes());
    }

    fn put_opt(hasher: &mut Xxh3, v: Option<f64>) {
        match v {
            Some(v) => {
                hasher.update(&[1]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            None => hasher.update(&[0]),
        }
    }

    let mut hasher = Xxh3::new();
    hasher.update(&(posts.len() as u64).to_le_bytes());
    for post in posts {
        put_str(&mut hasher, &post.country);
        hasher.update(&post.year.to_le_bytes());
        put_str(&mut hasher, &post.post_type);
        put_str(&mut hasher, &post.host_country);
        match post.overall_rank {
            Some(rank) => {
                hasher.update(&[1]);
                hasher.update(&rank.to_le_bytes());
            }
            None => hasher.update(&[0]),
        }
        put_opt(&mut hasher, post.population);
        put_opt(&mut hasher, post.gdp);
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn headers() -> Vec<String> {
        Column::ALL.iter().map(|c| c.header().to_string()).collect()
    }

    fn post(country: &str, year: i32) -> RawPost {
        RawPost {
            country: country.into(),
            year,
            post_type: "Embassy".into(),
            host_country: "Kenya".into(),
            overall_rank: Some(1),
            population: Some(10.0),
            gdp: Some(100.0),
        }
    }

    #[test]
    fn test_ingest_full_row() {
        let table = RawTable::new(
            headers(),
            vec![vec![
                json!("France"),
                json!(2023),
                json!(3),
                json!("Embassy"),
                json!("Kenya"),
                json!(68.2),
                json!(3030.0),
            ]],
        );

        let (store, report) = RecordStore::ingest(&table).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.accepted, 1);
        assert_eq!(
            store.posts()[0],
            RawPost {
                country: "France".into(),
                year: 2023,
                post_type: "Embassy".into(),
                host_country: "Kenya".into(),
                overall_rank: Some(3),
                population: Some(68.2),
                gdp: Some(3030.0),
            }
        );
    }

    #[test]
    fn test_missing_required_columns_reported_together() {
        let table = RawTable::new(
            vec!["COUNTRY".into(), "POST TYPE TITLE".into()],
            vec![vec![json!("France"), json!("Embassy")]],
        );

        match RecordStore::ingest(&table) {
            Err(AnalyticsError::Schema { missing }) => {
                assert_eq!(missing, vec!["Year".to_string(), "OVERALL RANK".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_checked_even_without_rows() {
        let table = RawTable::new(vec!["country".into()], vec![]);
        assert!(matches!(
            RecordStore::ingest(&table),
            Err(AnalyticsError::Schema { .. })
        ));
    }

    #[test]
    fn test_only_required_columns_is_enough() {
        let table = RawTable::new(
            vec!["Year".into(), "COUNTRY".into(), "OVERALL RANK".into()],
            vec![vec![json!(2021), json!("Chile"), json!("40")]],
        );

        let (store, report) = RecordStore::ingest(&table).unwrap();
        assert!(report.is_clean());
        let p = &store.posts()[0];
        assert_eq!(p.country, "Chile");
        assert_eq!(p.overall_rank, Some(40));
        assert_eq!(p.post_type, "");
        assert_eq!(p.population, None);
    }

    #[test]
    fn test_malformed_rows_are_dropped_and_counted() {
        let table = RawTable::new(
            headers(),
            vec![
                vec![json!("Peru"), json!(2021), json!(30)],
                vec![json!("Peru"), json!("n/a"), json!(30)],
                vec![json!(null), json!(2021), json!(30)],
                vec![json!("Peru"), json!(2021), json!(-4)],
                vec![json!("Peru"), json!(2021.5), json!(30)],
            ],
        );

        let (store, report) = RecordStore::ingest(&table).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped_count(), 3);
        assert_eq!(
            report.dropped[0],
            DroppedRow {
                row: 1,
                reason: DropReason::InvalidYear("\"n/a\"".into())
            }
        );
        assert_eq!(report.dropped[1].reason, DropReason::MissingCountry);
        assert_eq!(
            report.dropped[2],
            DroppedRow {
                row: 4,
                reason: DropReason::InvalidYear("2021.5".into())
            }
        );
    }

    #[test]
    fn test_unreadable_rank_keeps_the_post() {
        let chad = |rank: Value, post_type: &str, host: &str| {
            vec![json!("Chad"), json!(2020), rank, json!(post_type), json!(host)]
        };
        let table = RawTable::new(
            headers(),
            vec![
                chad(json!(40), "Embassy", "Mali"),
                chad(json!(null), "Embassy", "Niger"),
                chad(json!("n/a"), "Consulate", "Niger"),
                chad(json!(-4), "Embassy", "Niger"),
            ],
        );

        let (store, report) = RecordStore::ingest(&table).unwrap();
        assert!(report.is_clean());
        assert_eq!(store.len(), 4);
        let ranks: Vec<Option<u32>> = store.posts().iter().map(|p| p.overall_rank).collect();
        assert_eq!(ranks, vec![Some(40), None, None, None]);
    }

    #[test_case(json!(2020), Some(2020) ; "integer")]
    #[test_case(json!(2020.0), Some(2020) ; "integral float")]
    #[test_case(json!(" 2020 "), Some(2020) ; "padded string")]
    #[test_case(json!("2020.0"), Some(2020) ; "float string")]
    #[test_case(json!(2020.25), None ; "fractional")]
    #[test_case(json!(true), None ; "boolean")]
    #[test_case(json!(null), None ; "null")]
    fn test_coerce_int(cell: Value, expected: Option<i64>) {
        assert_eq!(coerce_int(&cell), expected);
    }

    #[test]
    fn test_coerce_float_and_text() {
        assert_eq!(coerce_float(&json!("1.5")), Some(1.5));
        assert_eq!(coerce_float(&json!("abc")), None);
        assert_eq!(coerce_text(&json!(null)), "");
        assert_eq!(coerce_text(&json!(42)), "42");
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = RecordStore::from_posts(vec![post("A", 2020), post("B", 2020)]);
        let same = RecordStore::from_posts(vec![post("A", 2020), post("B", 2020)]);
        let reordered = RecordStore::from_posts(vec![post("B", 2020), post("A", 2020)]);
        let mut changed = post("A", 2020);
        changed.gdp = None;
        let different = RecordStore::from_posts(vec![changed, post("B", 2020)]);

        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), reordered.fingerprint());
        assert_ne!(a.fingerprint(), different.fingerprint());
    }

    #[test]
    fn test_years_and_countries() {
        let store = RecordStore::from_posts(vec![
            post("Chile", 2021),
            post("Austria", 2019),
            post("Chile", 2019),
            post("Brazil", 2021),
        ]);

        assert_eq!(store.years(), vec![2019, 2021]);
        assert_eq!(store.latest_year(), Some(2021));
        assert_eq!(store.countries(None), vec!["Austria", "Brazil", "Chile"]);
        assert_eq!(store.countries(Some(2021)), vec!["Brazil", "Chile"]);
        assert!(store.countries(Some(1999)).is_empty());
    }

    #[test]
    fn test_empty_store() {
        let store = RecordStore::from_posts(Vec::new());
        assert!(store.is_empty());
        assert_eq!(store.latest_year(), None);
        assert!(store.years().is_empty());
    }
}
