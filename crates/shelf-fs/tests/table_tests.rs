use pretty_assertions::assert_eq;
use shelf_fs::table::{self, Table};
use shelf_fs::{Error, INVENTORY_FIELDS};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_key_values_round_trip_preserves_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("meta.csv");
    let pairs = vec![
        ("collected_by", "A. Person"),
        ("source_url", "https://example.org/data?a=1,b=2"),
        ("licence", ""),
    ];

    table::write_key_values(&path, &pairs).unwrap();
    let loaded = table::read_key_values(&path).unwrap();

    let expected: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(loaded, expected);
}

#[test]
fn test_key_values_rejects_three_columns() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("meta.csv");
    fs::write(&path, "date,2024,extra\n").unwrap();

    let err = table::read_key_values(&path).unwrap_err();
    assert!(matches!(err, Error::CsvParse { .. }), "got {err}");
}

#[test]
fn test_indexed_table_requires_exact_columns() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("source_inventory.csv");
    fs::write(&path, ",variable,entity\n0,a,b\n").unwrap();

    let err = table::read_indexed_table(&path, &INVENTORY_FIELDS).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }), "got {err}");
}

#[test]
fn test_indexed_table_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("inventory.csv");

    let mut headers = vec!["ID".to_string()];
    headers.extend(INVENTORY_FIELDS.iter().map(|f| f.to_string()));
    let mut row = vec!["emissions|demo".to_string()];
    row.extend(INVENTORY_FIELDS.iter().map(|f| format!("{f}-value")));
    let table_in = Table {
        headers,
        rows: vec![row],
    };

    table::write_table(&path, &table_in).unwrap();
    let table_out = table::read_indexed_table(&path, &INVENTORY_FIELDS).unwrap();

    assert_eq!(table_out, table_in);
}

#[test]
fn test_missing_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.csv");

    let err = table::read_key_values(&path).unwrap_err();
    assert!(err.to_string().contains("absent.csv"), "got {err}");
}
