use std::collections::HashSet;

use chrono::NaiveDate;
use mobilization_dashboard::data::{
    DataLoader, DataProcessor, DatasetSchema, DateRange, FilterParams,
};
use mobilization_dashboard::export::Exporter;
use mobilization_dashboard::stats::StatsCalculator;
use polars::prelude::*;
use proptest::prelude::*;

/// Timestamp as (day of February 2024, milliseconds past 08:00:00).
type Stamp = (u32, u32);
type Row = (Option<u8>, Option<u8>, Option<&'static str>, Option<Stamp>);

fn schema() -> DatasetSchema {
    DatasetSchema {
        id_column: "id".into(),
        phone_column: "phone".into(),
        category_column: "county".into(),
        timestamp_column: "Timestamp".into(),
    }
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (
        proptest::option::of(0u8..5),
        proptest::option::of(0u8..3),
        proptest::option::of(prop_oneof![Just("Nairobi"), Just("Kisumu"), Just("Mombasa")]),
        proptest::option::of((1u32..29, 0u32..1000)),
    )
}

/// CSV with a unique `row` column so records can be traced through the pipeline.
fn build_csv(rows: &[Row]) -> String {
    let mut csv = String::from("row,Timestamp,id,phone,county\n");
    for (i, (id, phone, county, day)) in rows.iter().enumerate() {
        let field = |v: Option<String>| v.unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            i,
            field(day.map(|(d, ms)| format!("2024-02-{:02} 08:00:00.{:03}", d, ms))),
            field(id.map(|v| v.to_string())),
            field(phone.map(|v| format!("07{}", v))),
            field(county.map(str::to_string)),
        ));
    }
    csv
}

fn load(rows: &[Row]) -> DataFrame {
    DataLoader::parse_csv(build_csv(rows).into_bytes(), &schema())
        .expect("generated CSV parses")
        .df
}

fn column_strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    let series = df
        .column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::String)
        .unwrap();
    series
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

proptest! {
    #[test]
    fn dedupe_never_grows_and_leaves_unique_keys(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let df = load(&rows);
        let clean = DataProcessor::dedupe(&df, schema().key_fields()).unwrap();
        prop_assert!(clean.height() <= df.height());

        let ids = column_strings(&clean, "id");
        let phones = column_strings(&clean, "phone");
        let keys: HashSet<_> = ids.into_iter().zip(phones).collect();
        prop_assert_eq!(keys.len(), clean.height());
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let df = load(&rows);
        let clean = DataProcessor::dedupe(&df, schema().key_fields()).unwrap();

        let mut seen = HashSet::new();
        let expected: Vec<Option<String>> = rows
            .iter()
            .enumerate()
            .filter(|(_, (id, phone, _, _))| seen.insert((*id, *phone)))
            .map(|(i, _)| Some(i.to_string()))
            .collect();
        prop_assert_eq!(column_strings(&clean, "row"), expected);
    }

    #[test]
    fn dedupe_is_idempotent(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let df = load(&rows);
        let once = DataProcessor::dedupe(&df, schema().key_fields()).unwrap();
        let twice = DataProcessor::dedupe(&once, schema().key_fields()).unwrap();
        prop_assert!(once.equals_missing(&twice));
    }

    #[test]
    fn filter_returns_subset(
        rows in proptest::collection::vec(row_strategy(), 0..40),
        pick in proptest::collection::btree_set(prop_oneof![Just("Nairobi"), Just("Kisumu"), Just("Mombasa")], 0..3),
        window in proptest::option::of((1u32..29, 0u32..10)),
    ) {
        let df = load(&rows);
        let params = FilterParams {
            categories: pick.iter().map(|s| s.to_string()).collect(),
            date_range: window.map(|(start, len)| {
                let start_day = NaiveDate::from_ymd_opt(2024, 2, start).unwrap();
                let end_day = NaiveDate::from_ymd_opt(2024, 2, (start + len).min(29)).unwrap();
                DateRange::new(start_day, end_day)
            }),
        };
        let filtered = DataProcessor::filter(&df, &schema(), &params).unwrap();
        prop_assert!(filtered.height() <= df.height());

        let all: HashSet<_> = column_strings(&df, "row").into_iter().collect();
        for row in column_strings(&filtered, "row") {
            prop_assert!(all.contains(&row));
        }
    }

    #[test]
    fn empty_filter_is_identity(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let df = load(&rows);
        let filtered = DataProcessor::filter(&df, &schema(), &FilterParams::default()).unwrap();
        prop_assert!(filtered.equals_missing(&df));
    }

    #[test]
    fn counts_sum_to_non_missing_records(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let df = load(&rows);
        let counts = StatsCalculator::count_by_category(&df, "county").unwrap();
        let total: usize = counts.iter().map(|c| c.count).sum();
        let missing = rows.iter().filter(|(_, _, county, _)| county.is_none()).count();
        prop_assert_eq!(total, df.height() - missing);

        for pair in counts.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn csv_export_round_trips(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let df = load(&rows);
        let bytes = Exporter::to_csv(&df).unwrap();
        let reparsed = DataLoader::parse_csv(bytes, &schema()).unwrap().df;
        prop_assert!(reparsed.equals_missing(&df));
    }
}

#[test]
fn scenario_five_records_with_one_duplicate() {
    let rows: Vec<Row> = vec![
        (Some(1), Some(1), Some("Nairobi"), None),
        (Some(2), Some(2), Some("Nairobi"), None),
        (Some(3), Some(0), Some("Kisumu"), None),
        (Some(2), Some(2), Some("Mombasa"), None),
        (Some(4), Some(1), Some("Kisumu"), None),
    ];
    let df = load(&rows);
    let clean = DataProcessor::dedupe(&df, schema().key_fields()).unwrap();
    assert_eq!(clean.height(), 4);
    assert_eq!(
        column_strings(&clean, "row"),
        vec![
            Some("0".to_string()),
            Some("1".to_string()),
            Some("2".to_string()),
            Some("4".to_string())
        ]
    );
}
