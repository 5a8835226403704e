use datascope_core::{
    DssError, IdentifierType, InstrumentColumns, InstrumentIdentifier, InstrumentList, Table,
};
use proptest::prelude::*;
use serde_json::json;
use std::io::Write;

#[test]
fn abbreviations_map_to_canonical_types() {
    assert_eq!(IdentifierType::normalize("CSP"), IdentifierType::Cusip);
    assert_eq!(IdentifierType::normalize("isn"), IdentifierType::Isin);
    assert_eq!(IdentifierType::normalize(" RIC "), IdentifierType::Ric);
    assert_eq!(IdentifierType::normalize("CHR"), IdentifierType::ChainRic);
    assert_eq!(IdentifierType::normalize("SED"), IdentifierType::Sedol);
    assert_eq!(IdentifierType::normalize("CIN"), IdentifierType::Cin);
}

#[test]
fn canonical_names_are_case_insensitive() {
    assert_eq!(IdentifierType::normalize("cusip"), IdentifierType::Cusip);
    assert_eq!(IdentifierType::normalize("OCCCODE"), IdentifierType::OccCode);
    assert_eq!(IdentifierType::normalize("ricroot"), IdentifierType::RicRoot);
    assert_eq!(IdentifierType::normalize("FundLipperId"), IdentifierType::FundLipperId);
}

#[test]
fn whole_token_only() {
    // Contains "RIC" but is its own scheme.
    assert_eq!(IdentifierType::normalize("RICRoot"), IdentifierType::RicRoot);
    assert_eq!(
        IdentifierType::normalize("RICX"),
        IdentifierType::Other("RICX".to_string())
    );
    assert_eq!(
        IdentifierType::normalize("  Valoren "),
        IdentifierType::Other("Valoren".to_string())
    );
}

#[test]
fn wire_names_and_known_list() {
    assert_eq!(IdentifierType::OccCode.as_str(), "OCCCode");
    assert_eq!(IdentifierType::RicRoot.as_str(), "RICRoot");
    assert_eq!(IdentifierType::all_known().len(), 10);
    assert!(IdentifierType::all_known().iter().all(|t| !t.is_other()));
}

#[test]
fn identifier_serializes_pascal_case_and_skips_missing_source() {
    let plain = InstrumentIdentifier::new("IBM.N", IdentifierType::Ric);
    assert_eq!(
        serde_json::to_value(&plain).unwrap(),
        json!({"Identifier": "IBM.N", "IdentifierType": "Ric"})
    );
    let sourced = InstrumentIdentifier::new("459200101", IdentifierType::Cusip).with_source("NYS");
    assert_eq!(
        serde_json::to_value(&sourced).unwrap(),
        json!({"Identifier": "459200101", "IdentifierType": "Cusip", "Source": "NYS"})
    );
    let blank = InstrumentIdentifier::new("X", IdentifierType::Ric).with_source("  ");
    assert_eq!(blank.source, None);
}

#[test]
fn csv_rows_of_two_three_and_four_columns() {
    let data = "\
CSP, 459200101
ISN,US4592001014,NYS

RIC,IBM.N,International Business Machines,NYQ
Sedol,2005973,,
";
    let list = InstrumentList::from_csv_reader(data.as_bytes()).unwrap();
    assert_eq!(list.len(), 4);
    let ids = list.as_slice();
    assert_eq!(ids[0].identifier, "459200101");
    assert_eq!(ids[0].identifier_type, IdentifierType::Cusip);
    assert_eq!(ids[0].source, None);
    assert_eq!(ids[1].source.as_deref(), Some("NYS"));
    assert_eq!(ids[2].identifier_type, IdentifierType::Ric);
    assert_eq!(ids[2].source.as_deref(), Some("NYQ"));
    assert_eq!(ids[3].identifier_type, IdentifierType::Sedol);
    assert_eq!(ids[3].source, None);
}

#[test]
fn csv_short_row_names_the_line() {
    let data = "RIC,IBM.N\nRIC\n";
    let err = InstrumentList::from_csv_reader(data.as_bytes()).unwrap_err();
    match err {
        DssError::InvalidArg(msg) => assert!(msg.contains("line 2"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn csv_blank_identifier_or_type_names_the_line() {
    for (data, line) in [("RIC,\n", "line 1"), ("RIC,IBM.N\n,IBM.N\n", "line 2")] {
        let err = InstrumentList::from_csv_reader(data.as_bytes()).unwrap_err();
        match err {
            DssError::InvalidArg(msg) => {
                assert!(msg.contains(line), "{msg}");
                assert!(msg.contains("missing identifier/type"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn csv_from_path_and_missing_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "RIC,VOD.L").unwrap();
    writeln!(f, "ISN,GB00BH4HKS39").unwrap();
    let list = InstrumentList::from_csv_path(f.path()).unwrap();
    assert_eq!(list.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let err = InstrumentList::from_csv_path(dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(err, DssError::Io(_)));
}

#[test]
fn from_table_defaults_to_first_two_columns() {
    let table = Table::from_value(&json!([
        {"type": "RIC", "id": "IBM.N", "exch": "NYQ"},
        {"type": "CSP", "id": 459200101, "exch": null},
    ]))
    .unwrap();
    let list = InstrumentList::from_table(&table, &InstrumentColumns::default()).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.as_slice()[1].identifier, "459200101");
    assert_eq!(list.as_slice()[1].identifier_type, IdentifierType::Cusip);

    let cols = InstrumentColumns {
        type_col: Some("type".into()),
        id_col: Some("id".into()),
        source_col: Some("exch".into()),
    };
    let list = InstrumentList::from_table(&table, &cols).unwrap();
    assert_eq!(list.as_slice()[0].source.as_deref(), Some("NYQ"));
    assert_eq!(list.as_slice()[1].source, None);
}

#[test]
fn from_table_rejects_unknown_column() {
    let table = Table::from_value(&json!([{"a": "RIC", "b": "IBM.N"}])).unwrap();
    let cols = InstrumentColumns {
        type_col: Some("kind".into()),
        ..InstrumentColumns::default()
    };
    assert!(matches!(
        InstrumentList::from_table(&table, &cols),
        Err(DssError::InvalidArg(_))
    ));
}

#[test]
fn single_builds_one_identifier() {
    let list = InstrumentList::single("IBM.N", IdentifierType::Ric, Some("NYQ"));
    assert_eq!(list.len(), 1);
    assert_eq!(
        serde_json::to_value(&list).unwrap(),
        json!([{"Identifier": "IBM.N", "IdentifierType": "Ric", "Source": "NYQ"}])
    );
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "[ A-Za-z]{0,12}") {
        let once = IdentifierType::normalize(&raw);
        let twice = IdentifierType::normalize(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn unknown_tokens_pass_through_trimmed(raw in "[A-Z][a-z]{5,10}") {
        let t = IdentifierType::normalize(&format!("  {raw}  "));
        let known = IdentifierType::all_known()
            .iter()
            .any(|k| k.as_str().eq_ignore_ascii_case(&raw));
        if !known {
            prop_assert_eq!(t, IdentifierType::Other(raw));
        }
    }
}
