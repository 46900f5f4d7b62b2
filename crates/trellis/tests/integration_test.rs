//! Integration tests for trellis.

use std::io::Write;
use tempfile::NamedTempFile;

use serde_json::{Value, json};
use trellis::display::{DisplayState, Layout};
use trellis::{
    Column, ConfigurationError, DataTable, DisplayModel, FilterState, KindName, MetaKind,
    MetaVariable, SortDirection, Trellis, TrellisConfig, TrellisError,
};

/// Helper to create a temporary CSV file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn countries() -> DataTable {
    DataTable::new(vec![
        Column::text("panel", ["panels/dz.png", "panels/dk.png", "panels/de.png"]),
        Column::categorical(
            "country",
            [Some("Algeria"), Some("Denmark"), Some("Germany")],
            None,
        ),
        Column::float("score", [85.5, 92.3, 78.9]),
    ])
    .expect("valid table")
}

fn gapminder_csv() -> String {
    let mut content = String::from("panel,continent,year,lifeExp,measured\n");
    let continents = ["Africa", "Americas", "Asia", "Europe"];
    for i in 0..40 {
        content.push_str(&format!(
            "panels/{i}.png,{},{},{:.1},2020-0{}-15\n",
            continents[i % 4],
            1952 + (i % 10) * 5,
            40.0 + i as f64 * 0.7,
            1 + i % 9
        ));
    }
    content
}

// =============================================================================
// Core Scenarios
// =============================================================================

#[test]
fn test_country_factor_is_one_origin() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    display.set_panel_column("panel").unwrap().infer_metas();

    let country = display.meta("country").unwrap();
    assert_eq!(
        country.kind,
        MetaKind::Factor {
            levels: vec!["Algeria".into(), "Denmark".into(), "Germany".into()]
        }
    );

    let document = display.serialize().unwrap();
    let wire: Vec<&Value> = document.data.iter().map(|row| &row["country"]).collect();
    assert_eq!(wire, [&json!(1), &json!(2), &json!(3)]);
}

#[test]
fn test_score_number_unchanged() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    display.set_panel_column("panel").unwrap().infer_metas();

    assert_eq!(
        display.meta("score").unwrap().kind,
        MetaKind::Number {
            digits: 2,
            locale: true,
            log: false
        }
    );

    let document = display.serialize().unwrap();
    let scores: Vec<f64> = document
        .data
        .iter()
        .map(|row| row["score"].as_f64().unwrap())
        .collect();
    assert_eq!(scores, [85.5, 92.3, 78.9]);
}

#[test]
fn test_missing_column_is_configuration_error() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    display.set_panel_column("panel").unwrap();

    let err = display
        .add_meta(MetaVariable::number("missing_col"))
        .unwrap_err();
    assert!(matches!(
        err,
        TrellisError::Configuration(ConfigurationError::ColumnNotFound { .. })
    ));

    // The display is still usable and serializes without the bad meta.
    let document = display.serialize().unwrap();
    assert!(document.data[0].get("missing_col").is_none());
}

#[test]
fn test_serialize_twice_is_identical() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    display.set_panel_column("panel").unwrap().infer_metas();

    let first = display.serialize().unwrap().to_json_pretty().unwrap();
    let second = display.serialize().unwrap().to_json_pretty().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_values_are_null() {
    let table = DataTable::new(vec![
        Column::text("panel", ["a", "b"]),
        Column::categorical("grp", [Some("x"), None::<&str>], None),
        Column::float("value", [f64::NAN, 1.0]),
        Column::integer("count", [None, Some(0)]),
        Column::text("note", ["hello", "NA"]),
    ])
    .unwrap();
    let mut display = DisplayModel::new("nulls", &table).unwrap();
    display
        .set_panel_column("panel")
        .unwrap()
        .add_meta(MetaVariable::factor("grp", ["x"]))
        .unwrap()
        .add_meta(MetaVariable::number("value"))
        .unwrap()
        .add_meta(MetaVariable::number("count"))
        .unwrap()
        .add_meta(MetaVariable::base("note"))
        .unwrap();

    let document = display.serialize().unwrap();
    assert_eq!(document.data[0]["grp"], json!(1));
    assert_eq!(document.data[1]["grp"], Value::Null);
    assert_eq!(document.data[0]["value"], Value::Null);
    assert_eq!(document.data[0]["count"], Value::Null);
    assert_eq!(document.data[1]["count"], json!(0));
    assert_eq!(document.data[1]["note"], Value::Null);
    assert!(document.audit().is_clean());
    assert_eq!(document.audit().total_missing(), 4);
}

#[test]
fn test_factor_declared_on_integer_column_round_trips() {
    let grades = [Some(1), Some(2), Some(3), Some(10), None];
    let table = DataTable::new(vec![
        Column::text("panel", ["a", "b", "c", "d", "e"]),
        Column::integer("grade", grades),
    ])
    .unwrap();
    let mut display = DisplayModel::new("grades", &table).unwrap();
    display
        .set_panel_column("panel")
        .unwrap()
        .declare("grade", "factor")
        .unwrap();

    let levels = display.meta("grade").unwrap().kind.levels().unwrap().to_vec();
    assert_eq!(levels, ["1", "2", "3", "10"]);

    let document = display.serialize().unwrap();
    for (record, raw) in document.data.iter().zip(grades) {
        match raw {
            Some(raw) => {
                let wire = record["grade"].as_u64().unwrap() as usize;
                assert_eq!(levels[wire - 1], raw.to_string());
            }
            None => assert_eq!(record["grade"], Value::Null),
        }
    }
    assert!(document.audit().is_clean());
}

// =============================================================================
// Cardinality
// =============================================================================

#[test]
fn test_cardinality_threshold() {
    let few: Vec<String> = (0..200).map(|i| format!("site_{}", i % 49)).collect();
    let many: Vec<String> = (0..200).map(|i| format!("site_{}", i % 51)).collect();
    let numeric: Vec<String> = (0..200).map(|i| format!("{}", i % 51)).collect();

    let trellis = Trellis::new();
    let engine = trellis.inference();
    assert_eq!(
        engine.infer(&Column::text("c", &few), "c").kind_name(),
        KindName::Factor
    );
    assert_eq!(
        engine.infer(&Column::text("c", &many), "c").kind_name(),
        KindName::Base
    );
    assert_eq!(
        engine.infer(&Column::text("c", &numeric), "c").kind_name(),
        KindName::Number
    );
}

// =============================================================================
// File Round Trip
// =============================================================================

#[test]
fn test_csv_to_saved_document() {
    let file = create_test_file(&gapminder_csv());
    let trellis = Trellis::new();
    let (table, source) = trellis.load(file.path()).unwrap();
    assert_eq!(source.row_count, 40);
    assert_eq!(source.format, "csv");

    let mut display = trellis.display("gapminder", &table, "panel").unwrap();
    assert_eq!(display.meta("continent").unwrap().kind_name(), KindName::Factor);
    assert_eq!(display.meta("year").unwrap().kind_name(), KindName::Factor);
    assert_eq!(display.meta("lifeExp").unwrap().kind_name(), KindName::Number);
    assert_eq!(display.meta("measured").unwrap().kind_name(), KindName::Factor);

    display
        .replace_meta(MetaVariable::date("measured"))
        .unwrap()
        .set_layout(Layout::new(4).with_nrow(2))
        .unwrap()
        .set_labels(["continent", "lifeExp"])
        .unwrap()
        .add_sort("lifeExp", SortDirection::Desc)
        .unwrap()
        .add_filter(FilterState::category("continent", ["Africa", "Asia"]))
        .unwrap()
        .set_key_columns(["panel"])
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gapminder").join("displayObj.json");
    display.serialize().unwrap().save(&path).unwrap();

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let info = &saved["display"];
    assert_eq!(info["name"], "gapminder");
    assert_eq!(info["keycols"], json!(["panel"]));
    assert_eq!(info["state"]["layout"]["ncol"], 4);
    assert_eq!(info["state"]["sorts"][0]["dir"], "desc");
    assert_eq!(info["state"]["filters"][0]["filtertype"], "category");

    let metas = info["metas"].as_array().unwrap();
    let names: Vec<&str> = metas.iter().map(|m| m["varname"].as_str().unwrap()).collect();
    assert_eq!(names, ["continent", "year", "lifeExp", "measured"]);
    assert_eq!(metas[3]["type"], "date");

    let rows = saved["data"].as_array().unwrap();
    assert_eq!(rows.len(), 40);
    assert_eq!(rows[0]["continent"], json!(1));
    assert_eq!(rows[3]["continent"], json!(4));
    assert_eq!(rows[0]["measured"], "2020-01-15");
    assert_eq!(rows[0]["panel"], "panels/0.png");
    assert_eq!(rows[0]["__PANEL_KEY__"], "panels/0.png");
}

#[test]
fn test_round_trip_decodes_labels() {
    let file = create_test_file(&gapminder_csv());
    let trellis = Trellis::new();
    let (table, _) = trellis.load(file.path()).unwrap();
    let mut display = trellis.display("gapminder", &table, "panel").unwrap();
    let levels = display
        .meta("continent")
        .unwrap()
        .kind
        .levels()
        .unwrap()
        .to_vec();

    let document = display.serialize().unwrap();
    for (row, record) in document.data.iter().enumerate() {
        let wire = record["continent"].as_u64().unwrap() as usize;
        let original = table.get(row, "continent").to_string();
        assert_eq!(levels[wire - 1], original);
    }
}

#[test]
fn test_config_changes_inference() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, r#"{{"inference": {{"max_factor_levels": 3}}}}"#).unwrap();
    let config = TrellisConfig::load(config_file.path()).unwrap();

    let file = create_test_file(&gapminder_csv());
    let trellis = Trellis::with_config(config);
    let (table, _) = trellis.load(file.path()).unwrap();
    let display = trellis.display("gapminder", &table, "panel").unwrap();
    assert_eq!(display.meta("continent").unwrap().kind_name(), KindName::Base);
}

#[test]
fn test_configured_date_format_encodes() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        r#"{{"inference": {{"date_formats": ["%d/%m/%Y"], "datetime_formats": []}}}}"#
    )
    .unwrap();
    let trellis = Trellis::with_config(TrellisConfig::load(config_file.path()).unwrap());

    let mut content = String::from("panel,when\n");
    for (i, (d, m)) in (1..=16).flat_map(|d| (1..=12).map(move |m| (d, m))).enumerate() {
        content.push_str(&format!("p{i}.png,{d:02}/{m:02}/2024\n"));
    }
    let file = create_test_file(&content);
    let (table, _) = trellis.load(file.path()).unwrap();

    let mut display = trellis.display("dates", &table, "panel").unwrap();
    assert_eq!(
        display.meta("when").unwrap().kind,
        MetaKind::Date {
            format: "%d/%m/%Y".to_string()
        }
    );

    let document = display.serialize().unwrap();
    assert_eq!(document.data.len(), 192);
    assert_eq!(document.data[0]["when"], "2024-01-01");
    assert_eq!(document.data[12]["when"], "2024-01-02");
    assert!(document.audit().is_clean());
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_rejected_display_produces_nothing() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    display
        .set_panel_column("panel")
        .unwrap()
        .infer_metas()
        .add_filter(FilterState::category("country", ["Atlantis"]))
        .unwrap();

    match display.serialize() {
        Err(TrellisError::Configuration(ConfigurationError::Rejected { violations })) => {
            assert_eq!(violations.len(), 1);
            assert!(violations[0].message.contains("Atlantis"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_views_are_checked_and_emitted() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    display.set_panel_column("panel").unwrap().infer_metas();

    let state = DisplayState {
        layout: Layout::new(3),
        sorts: vec![trellis::display::SortState::new("score", SortDirection::Asc)],
        ..DisplayState::default()
    };
    display.add_view("lowest first", state).unwrap();

    let document = display.serialize().unwrap();
    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["display"]["views"][0]["name"], "lowest first");
    assert_eq!(json["display"]["views"][0]["state"]["layout"]["ncol"], 3);
}

#[test]
fn test_schema_violation_for_bad_currency() {
    let table = countries();
    let mut display = DisplayModel::new("countries", &table).unwrap();
    let err = display
        .add_meta(MetaVariable::currency("score", "usd"))
        .unwrap_err();
    assert!(matches!(err, TrellisError::Schema(_)));
}
