//! End-to-end tests for loading, grouping and querying scoring tables
//!
//! The fixtures hold the same table twice, once as JSON and once as CSV
//! with shuffled columns, including rows the loader has to drop.

use std::collections::HashMap;
use wa_score_comparator::loader::{build_from_decoded, load, parse_json, Source, SourceFormat};
use wa_score_comparator::params::QueryParams;
use wa_score_comparator::query::query;
use wa_score_comparator::store::{IndexStore, LoadOutcome};
use wa_score_comparator::{Gender, GroupedIndex, LoadStats};

const JSON_FIXTURE: &str = "tests/fixtures/input/data_men.json";
const CSV_FIXTURE: &str = "tests/fixtures/input/data_men.csv";
const DAMAGED_CSV_FIXTURE: &str = "tests/fixtures/input/data_men_damaged.csv";

fn expected_stats() -> LoadStats {
    LoadStats {
        rows: 13,
        indexed: 10,
        malformed: 2,
        unrecognized_gender: 1,
        disciplines: 4,
    }
}

/// (discipline, gender) -> scores, in query output order
fn summarize(index: &GroupedIndex, params: &QueryParams) -> Vec<(String, Gender, Vec<i64>)> {
    query(index, params)
        .into_iter()
        .map(|v| {
            (
                v.discipline.to_string(),
                v.gender,
                v.records.iter().map(|r| r.score).collect(),
            )
        })
        .collect()
}

#[test]
fn test_load_json_fixture() {
    let data = load(&Source::new(JSON_FIXTURE)).expect("Failed to load JSON fixture");
    assert_eq!(data.stats, expected_stats());

    let keys: Vec<&str> = data.index.disciplines().collect();
    assert_eq!(keys, vec!["100m", "Long Jump", "Marathon", "60m"]);

    let sixty = data.index.buckets("60m").unwrap();
    assert_eq!(sixty.get(Gender::Male).len(), 1);
    assert!(sixty.get(Gender::Female).is_empty());
}

#[test]
fn test_csv_fixture_matches_json_fixture() {
    let json = load(&Source::new(JSON_FIXTURE)).unwrap();
    let csv = load(&Source::new(CSV_FIXTURE)).unwrap();
    assert_eq!(csv.stats, json.stats);

    for params in [
        QueryParams::new(),
        QueryParams::new().with_points(Some(1000)),
        QueryParams::new().with_selection(["Marathon", "100m"]),
    ] {
        assert_eq!(
            summarize(&csv.index, &params),
            summarize(&json.index, &params),
            "params: {:?}",
            params
        );
    }

    // Display values agree even where the CSV typing produced numbers
    let json_results: Vec<String> = query(&json.index, &QueryParams::new())
        .iter()
        .flat_map(|v| v.records.iter().map(|r| r.result.to_string()))
        .collect();
    let csv_results: Vec<String> = query(&csv.index, &QueryParams::new())
        .iter()
        .flat_map(|v| v.records.iter().map(|r| r.result.to_string()))
        .collect();
    assert_eq!(csv_results, json_results);
}

#[test]
fn test_undecodable_csv_row_is_dropped_not_fatal() {
    // Same table with one extra row whose Result cell is not UTF-8
    let data = load(&Source::new(DAMAGED_CSV_FIXTURE)).expect("Damaged row aborted the load");
    let expected = expected_stats();
    assert_eq!(
        data.stats,
        LoadStats {
            rows: expected.rows + 1,
            malformed: expected.malformed + 1,
            ..expected
        }
    );

    let clean = load(&Source::new(CSV_FIXTURE)).unwrap();
    assert_eq!(
        summarize(&data.index, &QueryParams::new()),
        summarize(&clean.index, &QueryParams::new())
    );
}

#[test]
fn test_format_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.txt");
    std::fs::copy(CSV_FIXTURE, &path).unwrap();

    let location = path.display().to_string();
    assert!(load(&Source::new(location.clone())).is_err());
    let data = load(&Source::new(location).with_format(Some(SourceFormat::Csv))).unwrap();
    assert_eq!(data.stats.indexed, 10);
}

#[test]
fn test_missing_file_is_an_error() {
    let err = load(&Source::new("tests/fixtures/input/absent.json")).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.json"));
}

#[test]
fn test_sprint_scenarios() {
    let decoded = parse_json(
        br#"[
            {"Points": 500, "Discipline": "100m", "Result": "11.50", "Gender": "M", "Environment": "outdoor"},
            {"Points": 500, "Discipline": "100m", "Result": "12.80", "Gender": "F", "Environment": "outdoor"},
            {"Points": 700, "Discipline": "100m", "Result": "10.95", "Gender": "M", "Environment": "outdoor"},
            {"Points": 650, "Discipline": "100m", "Result": "11.10", "Gender": "X", "Environment": "outdoor"}
        ]"#,
    )
    .unwrap();
    let index = build_from_decoded(&decoded).index;
    let selection = QueryParams::new().with_selection(["100m"]);

    assert_eq!(
        summarize(&index, &selection),
        vec![
            ("100m".to_string(), Gender::Male, vec![700, 500]),
            ("100m".to_string(), Gender::Female, vec![500]),
        ]
    );

    assert_eq!(
        summarize(&index, &selection.clone().with_points(Some(500))),
        vec![
            ("100m".to_string(), Gender::Male, vec![500]),
            ("100m".to_string(), Gender::Female, vec![500]),
        ]
    );

    assert!(summarize(&index, &QueryParams::new().with_selection(["nonexistent"])).is_empty());

    // The gender "X" row is invisible to every query
    for params in [
        QueryParams::new(),
        selection.clone(),
        QueryParams::new().with_points(Some(650)),
    ] {
        for view in query(&index, &params) {
            assert!(view.records.iter().all(|r| r.gender_code != "X"));
        }
    }
}

#[test]
fn test_query_properties_over_fixture() {
    let data = load(&Source::new(JSON_FIXTURE)).unwrap();
    let index = &data.index;

    // Unfiltered: every discipline with at least one kept record appears, and
    // a bucket shows up exactly when it has records
    let all = query(index, &QueryParams::new());
    let mut seen: HashMap<&str, Vec<Gender>> = HashMap::new();
    for view in &all {
        seen.entry(view.discipline).or_default().push(view.gender);
    }
    for (discipline, buckets) in index.iter() {
        for gender in Gender::ALL {
            let shown = seen
                .get(discipline)
                .is_some_and(|g| g.contains(&gender));
            assert_eq!(shown, !buckets.get(gender).is_empty());
        }
    }

    // Records sit in the bucket named by their own code
    for view in &all {
        for record in &view.records {
            assert_eq!(record.gender(), Some(view.gender));
            assert_eq!(record.discipline, view.discipline);
        }
    }

    // Point filter is exact and output is sorted descending
    for points in [900, 1000, 1150, 1200] {
        let params = QueryParams::new().with_points(Some(points));
        for view in query(index, &params) {
            assert!(view.records.iter().all(|r| r.score == points));
        }
    }
    for view in &all {
        assert!(view.records.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_store_reload_flow() {
    let store = IndexStore::new();
    assert!(query(&store.current(), &QueryParams::new()).is_empty());

    let first = store.begin_load();
    let second = store.begin_load();

    let csv = load(&Source::new(CSV_FIXTURE)).unwrap();
    assert_eq!(
        store.complete(second, csv.index, csv.stats),
        LoadOutcome::Installed
    );

    let json = load(&Source::new(JSON_FIXTURE)).unwrap();
    assert_eq!(
        store.complete(first, json.index, json.stats),
        LoadOutcome::Superseded
    );

    let current = store.current();
    assert_eq!(current.len(), 4);
    assert_eq!(store.stats(), Some(expected_stats()));
}
