use datascope_core::{DssError, Table};
use serde_json::{Value, json};

fn sample() -> Table {
    Table::from_value(&json!([
        {"RIC": "IBM.N", "Close": 191.5},
        {"RIC": "VOD.L", "Currency": "GBp"},
        {"RIC": "BAR, PLC", "Close": null, "Tags": ["a", "b"]}
    ]))
    .unwrap()
}

#[test]
fn columns_in_first_seen_order_with_null_fill() {
    let t = sample();
    assert_eq!(t.columns(), ["RIC", "Close", "Currency", "Tags"]);
    assert_eq!(t.rows()[0][2], Value::Null);
    assert_eq!(t.column("Currency").unwrap()[1], &json!("GBp"));
}

#[test]
fn csv_output_has_header_and_no_index() {
    let mut out = Vec::new();
    sample().write_csv(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "RIC,Close,Currency,Tags");
    assert_eq!(lines[1], "IBM.N,191.5,,");
    assert_eq!(lines[2], "VOD.L,,GBp,");
    assert_eq!(lines[3], r#""BAR, PLC",,,"[""a"",""b""]""#);
}

#[test]
fn empty_table_writes_nothing() {
    let mut out = Vec::new();
    Table::default().write_csv(&mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn filter_and_select() {
    let t = sample();
    let priced = t.filter(|r| r.get("Close").is_some_and(|v| !v.is_null()));
    assert_eq!(priced.len(), 1);
    let only = t.select(&["Currency", "RIC"]).unwrap();
    assert_eq!(only.columns(), ["Currency", "RIC"]);
    assert_eq!(only.rows()[1][0], json!("GBp"));
    assert!(matches!(t.select(&["Nope"]), Err(DssError::InvalidArg(_))));
}

#[test]
fn records_round_back_to_objects() {
    let t = sample();
    let recs = t.to_records();
    assert_eq!(recs[1], json!({"RIC": "VOD.L", "Currency": "GBp"}));
    let first = t.iter_records().next().unwrap();
    assert_eq!(first.get_str("RIC"), Some("IBM.N"));
}

#[test]
fn non_object_rows_are_rejected() {
    assert!(matches!(
        Table::from_value(&json!([1, 2])),
        Err(DssError::Data(_))
    ));
}

#[test]
fn push_row_checks_width() {
    let mut t = Table::new(vec!["a".into(), "b".into()]);
    t.push_row(vec![json!(1), json!(2)]).unwrap();
    assert!(t.push_row(vec![json!(1)]).is_err());
    assert_eq!(t.len(), 1);
}

#[test]
fn write_csv_path_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    std::fs::write(&path, "stale\nstale\nstale\nstale\nstale\n").unwrap();
    sample().write_csv_path(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("RIC,Close,Currency,Tags\n"));
    assert!(!text.contains("stale"));
}

#[cfg(feature = "dataframe")]
#[test]
fn to_polars_keeps_shape() {
    let df = sample().to_polars().unwrap();
    assert_eq!(df.shape(), (3, 4));
}
