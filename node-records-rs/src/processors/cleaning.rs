//! End-to-end cleaning of a node record file.
//!
//! Load, split into banks, project and rename each bank, merge them by row
//! position, optionally remove stationary samples, then either write the
//! `_CLEAN` file or hand the table back.

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use super::merging::{merge_banks, MergeError};
use super::projection::{project_block, ProjectionError};
use super::splitting::{split_banks, SplitError};
use super::stationary::{remove_stationary_samples, ChannelRetention, StationaryError};
use crate::config::PipelineConfig;
use crate::core::loaders::{load_node_records_csv, LoaderError, NodeTable, RawTable};
use crate::core::schema::Bank;
use crate::core::writers::{clean_output_path, write_table_csv, WriteError};

/// Broad category of a cleaning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Marker rows or bank lengths do not fit the two-bank layout
    Structural,
    /// Expected columns are absent
    Schema,
    /// Input unreadable or output unwritable
    Io,
    /// Invalid pipeline configuration
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Structural => "structural error",
            ErrorKind::Schema => "schema error",
            ErrorKind::Io => "I/O error",
            ErrorKind::Config => "configuration error",
        };
        f.write_str(name)
    }
}

/// Errors that abort cleaning of one file.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("failed to split blocks: {0}")]
    Split(#[from] SplitError),

    #[error("failed to project columns: {0}")]
    Projection(#[from] ProjectionError),

    #[error("failed to merge banks: {0}")]
    Merge(#[from] MergeError),

    #[error("stationary filter failed: {0}")]
    Stationary(#[from] StationaryError),

    #[error("failed to load input: {0}")]
    Load(#[from] LoaderError),

    #[error("failed to write output: {0}")]
    Write(#[from] WriteError),
}

impl CleanError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CleanError::Split(_) => ErrorKind::Structural,
            CleanError::Projection(_) => ErrorKind::Schema,
            CleanError::Merge(MergeError::RowCountMismatch { .. }) => ErrorKind::Structural,
            CleanError::Merge(_) => ErrorKind::Schema,
            CleanError::Stationary(StationaryError::InvalidFactor(_)) => ErrorKind::Config,
            CleanError::Stationary(StationaryError::MissingColumn(_) | StationaryError::ColumnClash(_)) => {
                ErrorKind::Schema
            }
            CleanError::Load(LoaderError::EmptyFile(_)) => ErrorKind::Structural,
            CleanError::Load(_) | CleanError::Write(_) => ErrorKind::Io,
        }
    }
}

/// Row counts and filter statistics of one cleaning run.
#[derive(Debug, Clone, Default)]
pub struct CleanSummary {
    pub bank_a_rows: usize,
    pub bank_b_rows: usize,
    /// Rows after the bank merge
    pub cleaned_rows: usize,
    /// Rows in the final table
    pub output_rows: usize,
    pub output_columns: usize,
    /// Marker-delimited blocks after bank B that were not used
    pub ignored_blocks: usize,
    /// Per-channel kept samples when the stationary filter ran
    pub retention: Option<Vec<ChannelRetention>>,
}

impl CleanSummary {
    /// Channel samples blanked by the stationary filter.
    pub fn stationary_dropped(&self) -> Option<usize> {
        self.retention
            .as_ref()
            .map(|r| r.iter().map(|c| self.output_rows - c.retained).sum())
    }
}

/// Where the cleaned table went.
#[derive(Debug, Clone)]
pub enum CleanOutput {
    /// Written to this path
    Saved(PathBuf),
    /// Handed back to the caller, nothing written
    Table(NodeTable),
}

/// Result of cleaning one file.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub output: CleanOutput,
    pub summary: CleanSummary,
}

impl CleanOutcome {
    /// Output path in save mode.
    pub fn saved_path(&self) -> Option<&Path> {
        match &self.output {
            CleanOutput::Saved(path) => Some(path),
            CleanOutput::Table(_) => None,
        }
    }

    /// The cleaned table when not saved.
    pub fn into_table(self) -> Option<NodeTable> {
        match self.output {
            CleanOutput::Table(table) => Some(table),
            CleanOutput::Saved(_) => None,
        }
    }
}

/// Run the cleaning stages on an already loaded table.
///
/// Returns the cleaned table (compressed when the stationary filter is
/// enabled) and a summary of the run. Nothing is read or written.
pub fn clean_table(raw: &RawTable, config: &PipelineConfig) -> Result<(NodeTable, CleanSummary), CleanError> {
    let banks = split_banks(raw, &config.blocks)?;

    let bank_a = project_block(&banks.bank_a, Bank::A)?;
    let bank_b = project_block(&banks.bank_b, Bank::B)?;
    let cleaned = merge_banks(&bank_a, &bank_b, &config.merge)?;

    let mut summary = CleanSummary {
        bank_a_rows: bank_a.num_rows(),
        bank_b_rows: bank_b.num_rows(),
        cleaned_rows: cleaned.num_rows(),
        ignored_blocks: banks.ignored,
        ..CleanSummary::default()
    };

    let table = if config.stationary.enabled {
        let compressed = remove_stationary_samples(&cleaned, &config.stationary)?;
        summary.retention = Some(compressed.retention);
        compressed.table
    } else {
        cleaned
    };

    summary.output_rows = table.num_rows();
    summary.output_columns = table.num_columns();
    Ok((table, summary))
}

/// Clean a node record CSV file.
///
/// In save mode (`config.output.save`, the default) the table is written to
/// `{stem}_CLEAN{ext}` beside the input, or in `config.output.directory`,
/// and the outcome carries that path. Otherwise nothing is written and the
/// outcome carries the table.
///
/// # Errors
///
/// Any failure aborts the whole file; no partial output is written.
///
/// # Example
///
/// ```no_run
/// use node_records::config::PipelineConfig;
/// use node_records::processors::cleaning::clean_node_records;
///
/// let outcome = clean_node_records("records.csv", &PipelineConfig::default()).unwrap();
/// println!("{:?}", outcome.saved_path());
/// ```
pub fn clean_node_records<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<CleanOutcome, CleanError> {
    let path = path.as_ref();
    let raw = load_node_records_csv(path)?;
    info!("Loaded {} rows x {} columns from {}", raw.num_rows(), raw.headers.len(), path.display());

    let (table, summary) = clean_table(&raw, config)?;

    let output = if config.output.save {
        let out_path = clean_output_path(path, &config.output.suffix, config.output.directory.as_deref())?;
        write_table_csv(&out_path, &table)?;
        info!("Cleaned table saved in '{}'", out_path.display());
        CleanOutput::Saved(out_path)
    } else {
        CleanOutput::Table(table)
    };

    Ok(CleanOutcome { output, summary })
}
