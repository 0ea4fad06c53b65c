//! Inventory tables: one row per dataset variable, indexed by row label.

use std::path::Path;

use shelf_fs::INVENTORY_FIELDS;
use shelf_fs::table::{self, Table};

use crate::Result;

/// Position of the `source` column, counting the leading index column.
const SOURCE_COLUMN: usize = 7;

/// An inventory as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    table: Table,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// An inventory with the standard header and no rows.
    pub fn new() -> Self {
        let mut headers = vec![String::new()];
        headers.extend(INVENTORY_FIELDS.iter().map(|f| f.to_string()));
        Self {
            table: Table {
                headers,
                rows: Vec::new(),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table = table::read_indexed_table(path, &INVENTORY_FIELDS)?;
        Ok(Self { table })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        table::write_table(path, &self.table)?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.table.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.table.rows
    }

    pub fn len(&self) -> usize {
        self.table.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.rows.is_empty()
    }

    /// Append a row given as index label plus [`INVENTORY_FIELDS`] values.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.table.rows.push(row);
    }

    /// Rows attributed to `source_id`.
    pub fn rows_of<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a Vec<String>> {
        self.table
            .rows
            .iter()
            .filter(move |row| row.get(SOURCE_COLUMN).map(String::as_str) == Some(source_id))
    }

    /// Replace every row of `source_id` with the rows of `fresh`.
    ///
    /// Rows of other sources keep their order; the fresh rows are appended.
    pub fn merge_source(&self, source_id: &str, fresh: &Inventory) -> Inventory {
        let mut rows: Vec<Vec<String>> = self
            .table
            .rows
            .iter()
            .filter(|row| row.get(SOURCE_COLUMN).map(String::as_str) != Some(source_id))
            .cloned()
            .collect();
        rows.extend(fresh.table.rows.iter().cloned());

        Inventory {
            table: Table {
                headers: self.table.headers.clone(),
                rows,
            },
        }
    }
}
