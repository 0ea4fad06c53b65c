//! CSV codecs for ledgers, metadata dumps and inventories
//!
//! Every table is validated against a fixed column set when read. Writes are
//! rendered in memory and flushed with [`io::write_atomic`].

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result, io};

/// Untyped table: a header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read typed rows from a headed CSV file.
///
/// The header must contain exactly the `expected` columns (in any order).
pub fn read_rows<T: DeserializeOwned>(path: &Path, expected: &[&str]) -> Result<Vec<T>> {
    let content = io::read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::csv_parse(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    check_columns(path, expected, &headers)?;

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.map_err(|e| Error::csv_parse(path, e))?);
    }
    Ok(rows)
}

/// Write typed rows under an explicit header.
///
/// The header is always written, so an empty table still round-trips.
pub fn write_rows<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .map_err(|e| serialize_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| serialize_error(path, e))?;
    }

    let bytes = finish(path, writer)?;
    io::write_atomic(path, &bytes)
}

/// Read a header-less two-column key/value file.
pub fn read_key_values(path: &Path) -> Result<Vec<(String, String)>> {
    let content = io::read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::csv_parse(path, e))?;
        match (record.get(0), record.get(1), record.len()) {
            (Some(key), Some(value), 2) => pairs.push((key.to_string(), value.to_string())),
            _ => {
                return Err(Error::CsvParse {
                    path: path.to_path_buf(),
                    message: format!(
                        "expected two columns (key, value), found {} in {:?}",
                        record.len(),
                        record
                    ),
                });
            }
        }
    }
    Ok(pairs)
}

/// Write a header-less two-column key/value file.
pub fn write_key_values<K, V>(path: &Path, pairs: &[(K, V)]) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for (key, value) in pairs {
        writer
            .write_record([key.as_ref(), value.as_ref()])
            .map_err(|e| serialize_error(path, e))?;
    }
    let bytes = finish(path, writer)?;
    io::write_atomic(path, &bytes)
}

/// Read an untyped table whose header must start with an index column
/// followed by exactly `columns`.
pub fn read_indexed_table(path: &Path, columns: &[&str]) -> Result<Table> {
    let content = io::read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::csv_parse(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let data_columns = headers.get(1..).unwrap_or_default();
    if data_columns != columns {
        return Err(Error::SchemaMismatch {
            path: path.to_path_buf(),
            expected: columns.join(", "),
            found: data_columns.join(", "),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::csv_parse(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

/// Write an untyped table.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(&table.headers)
        .map_err(|e| serialize_error(path, e))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| serialize_error(path, e))?;
    }
    let bytes = finish(path, writer)?;
    io::write_atomic(path, &bytes)
}

fn check_columns(path: &Path, expected: &[&str], found: &[String]) -> Result<()> {
    let expected_set: BTreeSet<&str> = expected.iter().copied().collect();
    let found_set: BTreeSet<&str> = found.iter().map(String::as_str).collect();

    if expected_set != found_set || found.len() != expected.len() {
        return Err(Error::SchemaMismatch {
            path: path.to_path_buf(),
            expected: expected.join(", "),
            found: found.join(", "),
        });
    }
    Ok(())
}

fn finish(path: &Path, writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| Error::CsvSerialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn serialize_error(path: &Path, err: csv::Error) -> Error {
    Error::CsvSerialize {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        tag: Option<String>,
    }

    #[test]
    fn empty_table_keeps_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.csv");

        write_rows::<Row>(&path, &["id", "tag"], &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,tag\n");
        let rows: Vec<Row> = read_rows(&path, &["id", "tag"]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn empty_cell_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.csv");
        std::fs::write(&path, "id,tag\na,\nb,v1.0\n").unwrap();

        let rows: Vec<Row> = read_rows(&path, &["id", "tag"]).unwrap();
        assert_eq!(rows[0].tag, None);
        assert_eq!(rows[1].tag.as_deref(), Some("v1.0"));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("t.csv");
        std::fs::write(&path, "id,tag,extra\na,,x\n").unwrap();

        let err = read_rows::<Row>(&path, &["id", "tag"]).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }), "got {err}");
    }
}
