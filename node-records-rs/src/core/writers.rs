//! Data writers for cleaned node record tables.
//!
//! Tables are written as comma-separated text with a header row and no
//! row-index column. Missing cells are written empty.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::loaders::NodeTable;

/// Suffix appended to the input file stem for cleaned output.
pub const CLEAN_SUFFIX: &str = "_CLEAN";

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Input path has no file name to derive an output name from.
    #[error("cannot derive an output file name from '{0}'")]
    NoFileName(PathBuf),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Derive the cleaned output path for an input file.
///
/// `dir/records.csv` becomes `dir/records{suffix}.csv`. A file without an
/// extension keeps none. When `output_dir` is given the file lands there
/// instead of next to the input.
///
/// # Example
///
/// ```
/// use node_records::core::writers::{clean_output_path, CLEAN_SUFFIX};
/// use std::path::Path;
///
/// let out = clean_output_path(Path::new("logs/run1.csv"), CLEAN_SUFFIX, None).unwrap();
/// assert_eq!(out, Path::new("logs/run1_CLEAN.csv"));
/// ```
pub fn clean_output_path(input: &Path, suffix: &str, output_dir: Option<&Path>) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| WriteError::NoFileName(input.to_path_buf()))?;

    let mut name = OsString::from(stem);
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(name))
}

/// Write a table as CSV to any writer.
///
/// `label` names the destination in error messages.
pub fn write_table<W: Write>(writer: W, table: &NodeTable, label: &str) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    // Write header
    csv_writer
        .write_record(table.column_names())
        .map_err(|e| WriteError::CsvError {
            path: label.to_string(),
            source: e,
        })?;

    // Write data rows
    for row in 0..table.num_rows() {
        csv_writer
            .write_record(table.row(row).into_iter().map(|cell| cell.unwrap_or("")))
            .map_err(|e| WriteError::CsvError {
                path: label.to_string(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: label.to_string(),
        source: e,
    })?;

    Ok(())
}

/// Write a table to a CSV file.
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
pub fn write_table_csv(path: &Path, table: &NodeTable) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;

    write_table(BufWriter::new(file), table, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::Column;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_table() -> NodeTable {
        NodeTable::from_columns(vec![
            Column::new("Time", vec![Some("0.0".into()), Some("0.1".into())]),
            Column::new("AExp1", vec![Some("1.5".into()), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_clean_output_path() {
        let out = clean_output_path(Path::new("/data/logs/run.csv"), CLEAN_SUFFIX, None).unwrap();
        assert_eq!(out, PathBuf::from("/data/logs/run_CLEAN.csv"));
    }

    #[test]
    fn test_clean_output_path_no_extension_or_dir() {
        let out = clean_output_path(Path::new("run"), CLEAN_SUFFIX, None).unwrap();
        assert_eq!(out, PathBuf::from("run_CLEAN"));
    }

    #[test]
    fn test_clean_output_path_custom_dir() {
        let out = clean_output_path(
            Path::new("/data/logs/run.v2.csv"),
            CLEAN_SUFFIX,
            Some(Path::new("/tmp/out")),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/tmp/out/run.v2_CLEAN.csv"));
    }

    #[test]
    fn test_clean_output_path_rejects_root() {
        let result = clean_output_path(Path::new("/"), CLEAN_SUFFIX, None);
        assert!(matches!(result, Err(WriteError::NoFileName(_))));
    }

    #[test]
    fn test_write_table_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_table_csv(&path, &create_test_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["Time,AExp1", "0.0,1.5", "0.1,"]);
    }

    #[test]
    fn test_write_table_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        write_table_csv(&path, &create_test_table()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_write_table_to_buffer() {
        let mut buf = Vec::new();
        write_table(&mut buf, &create_test_table(), "buffer").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Time,AExp1\n0.0,1.5\n0.1,\n");
    }
}
