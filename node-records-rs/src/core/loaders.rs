//! Data loaders and in-memory tables for node record files.
//!
//! This module provides:
//! - `RawTable`, the file exactly as read (header labels plus string rows)
//! - `NodeTable`, a column-oriented table keyed by validated column name
//! - CSV loading for node record logs

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// A node record file as loaded: the first line's labels and every
/// following line as a row of string cells.
///
/// Rows are kept as read. Repeated header lines inside the file (block
/// markers) are ordinary rows here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column labels from the first line of the file.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter or longer than `headers`.
    pub rows: Vec<Vec<String>>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            source_path: None,
        }
    }

    /// Returns the number of data rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first column carrying `label`.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }
}

/// A named column of optional string cells.
///
/// `None` marks a missing cell: either the source row was too short, or the
/// sample was dropped by the stationary filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at `row`, or `None` when missing or out of range.
    #[inline]
    pub fn get(&self, row: usize) -> Option<&str> {
        self.values.get(row).and_then(|v| v.as_deref())
    }
}

/// Column-oriented table with a name index built once on construction.
///
/// Every column has the same length. Column names are unique; pushing a
/// duplicate name replaces nothing and is rejected by `push_column`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    num_rows: usize,
}

impl NodeTable {
    /// Creates an empty table with `num_rows` rows and no columns.
    pub fn with_rows(num_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            index: HashMap::new(),
            num_rows,
        }
    }

    /// Appends a column.
    ///
    /// Returns the column back if its name is already taken or its length
    /// does not match the table.
    pub fn push_column(&mut self, column: Column) -> std::result::Result<(), Column> {
        if self.index.contains_key(&column.name) || column.len() != self.num_rows {
            return Err(column);
        }
        self.index.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Builds a table from columns, rejecting the first column that clashes
    /// by name or length with those before it.
    pub fn from_columns(columns: Vec<Column>) -> std::result::Result<Self, Column> {
        let num_rows = columns.first().map_or(0, Column::len);
        let mut table = Self::with_rows(num_rows);
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Keeps only the rows at `rows`, in that order, under the same columns.
    ///
    /// Positions past the end become missing cells.
    pub fn select_rows(&self, rows: &[usize]) -> NodeTable {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = rows.iter().map(|&r| c.values.get(r).cloned().flatten()).collect();
                Column::new(c.name.clone(), values)
            })
            .collect();
        NodeTable {
            columns,
            index: self.index.clone(),
            num_rows: rows.len(),
        }
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Named column lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Cell lookup by column name and row position.
    pub fn cell(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name).and_then(|c| c.get(row))
    }

    /// Row `row` as optional cells in column order.
    pub fn row(&self, row: usize) -> Vec<Option<&str>> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }
}

/// Load a node record file from a CSV path.
///
/// The first line supplies the column labels. The reader is flexible: later
/// header lines and ragged rows are kept as plain rows.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed, or if it holds
/// no data rows.
pub fn load_node_records_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoaderError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut table = read_node_records(BufReader::new(file))?;
    if table.rows.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }
    table.source_path = Some(path.to_path_buf());
    Ok(table)
}

/// Read a node record table from any reader.
pub fn read_node_records<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_node_records_csv() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Time,Exp1,Prim1,Sec1").unwrap();
        writeln!(file, "0.0,1.0,1.1,1.2").unwrap();
        writeln!(file, "Time,CarExp,CarPrim,CarSec").unwrap();
        writeln!(file, "0.0,2.0,2.1").unwrap();
        file.flush().unwrap();

        let table = load_node_records_csv(file.path())?;
        assert_eq!(table.headers, vec!["Time", "Exp1", "Prim1", "Sec1"]);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.rows[1][0], "Time");
        // ragged rows are kept as-is
        assert_eq!(table.rows[2].len(), 3);
        assert_eq!(table.column_index("Prim1"), Some(2));
        assert_eq!(table.source_path.as_deref(), Some(file.path()));

        Ok(())
    }

    #[test]
    fn test_load_header_only_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Time,Exp1,Prim1,Sec1").unwrap();
        file.flush().unwrap();

        let result = load_node_records_csv(file.path());
        assert!(matches!(result, Err(LoaderError::EmptyFile(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_node_records_csv("/nonexistent/dir/records.csv");
        assert!(matches!(result, Err(LoaderError::Open { .. })));
    }

    #[test]
    fn test_node_table_lookup() {
        let table = NodeTable::from_columns(vec![
            Column::new("Time", vec![Some("0".into()), Some("1".into())]),
            Column::new("AExp1", vec![Some("5.0".into()), None]),
        ])
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.column_names(), vec!["Time", "AExp1"]);
        assert_eq!(table.cell("AExp1", 0), Some("5.0"));
        assert_eq!(table.cell("AExp1", 1), None);
        assert_eq!(table.row(1), vec![Some("1"), None]);
        assert!(table.column("BExp1").is_none());
    }

    #[test]
    fn test_node_table_rejects_duplicates_and_ragged_columns() {
        let mut table = NodeTable::with_rows(1);
        assert!(table.push_column(Column::new("Time", vec![Some("0".into())])).is_ok());
        assert!(table.push_column(Column::new("Time", vec![Some("1".into())])).is_err());
        assert!(table.push_column(Column::new("AExp1", vec![])).is_err());
        assert_eq!(table.num_columns(), 1);
    }

    #[test]
    fn test_node_table_select_rows() {
        let table = NodeTable::from_columns(vec![
            Column::new("Time", vec![Some("0".into()), Some("1".into()), Some("2".into())]),
            Column::new("AExp1", vec![Some("a".into()), None, Some("c".into())]),
        ])
        .unwrap();

        let picked = table.select_rows(&[2, 0, 7]);
        assert_eq!(picked.num_rows(), 3);
        assert_eq!(picked.column_names(), vec!["Time", "AExp1"]);
        assert_eq!(picked.row(0), vec![Some("2"), Some("c")]);
        assert_eq!(picked.row(1), vec![Some("0"), Some("a")]);
        assert_eq!(picked.row(2), vec![None, None]);
    }
}
