//! Stationary-sample filter for cleaned node record tables.
//!
//! Leaves spend most of a delivery parked. The filter first keeps every
//! n-th row of the cleaned table, then blanks, per channel, every sample
//! whose detector value did not change since the last kept sample of that
//! channel. Change detection and the time axis both run on the downsampled
//! rows, so every output row is a real downsampled time sample and each
//! channel keeps its own subset of them.

use log::{debug, info};
use thiserror::Error;

use crate::config::StationaryConfig;
use crate::core::loaders::{Column, NodeTable};
use crate::core::schema::{Channel, TIME_COLUMN};
use crate::core::transforms::{apply_keep_mask, downsample_table, stationary_keep_mask};

/// Errors that can occur in the stationary filter.
#[derive(Debug, Error)]
pub enum StationaryError {
    #[error("downsample factor must be at least 1, got {0}")]
    InvalidFactor(usize),

    #[error("cleaned table has no column '{0}'")]
    MissingColumn(String),

    #[error("column '{0}' clashes with another column of the compressed table")]
    ColumnClash(String),
}

/// Number of samples one channel kept after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRetention {
    pub channel: Channel,
    pub retained: usize,
}

/// Output of the stationary filter.
#[derive(Debug, Clone)]
pub struct CompressedTable {
    /// Downsampled `Time` plus every channel column; dropped samples are
    /// missing cells
    pub table: NodeTable,
    /// Row count after downsampling
    pub downsampled_rows: usize,
    /// Per-channel kept sample counts in channel order
    pub retention: Vec<ChannelRetention>,
}

impl CompressedTable {
    /// Kept sample count of one channel.
    pub fn retained(&self, channel: Channel) -> Option<usize> {
        self.retention
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| r.retained)
    }

    /// Total channel samples blanked as stationary.
    pub fn dropped_samples(&self) -> usize {
        self.retention
            .iter()
            .map(|r| self.downsampled_rows - r.retained)
            .sum()
    }
}

fn lookup<'a>(table: &'a NodeTable, name: &str) -> Result<&'a Column, StationaryError> {
    table
        .column(name)
        .ok_or_else(|| StationaryError::MissingColumn(name.to_string()))
}

/// Downsample a cleaned table and blank stationary samples per channel.
///
/// Channels are processed bank A leaves 1..=60, then bank B. The detector
/// column (`Exp` by default) decides which rows a channel keeps; the other
/// two columns of the channel follow the same rows.
///
/// # Errors
///
/// Returns an error for a downsample factor of 0, or when the table lacks
/// `Time` or any channel column.
pub fn remove_stationary_samples(
    cleaned: &NodeTable,
    config: &StationaryConfig,
) -> Result<CompressedTable, StationaryError> {
    if config.downsample_factor == 0 {
        return Err(StationaryError::InvalidFactor(config.downsample_factor));
    }

    let downsampled = downsample_table(cleaned, config.downsample_factor);
    let num_rows = downsampled.num_rows();

    let mut columns = vec![lookup(&downsampled, TIME_COLUMN)?.clone()];

    let mut retention = Vec::new();
    for channel in Channel::all() {
        let detector = lookup(&downsampled, &channel.column(config.detector))?;
        let series: Vec<Option<&str>> = (0..num_rows).map(|row| detector.get(row)).collect();
        let mask = stationary_keep_mask(&series);

        for name in channel.columns() {
            let column = lookup(&downsampled, &name)?;
            columns.push(apply_keep_mask(column, &mask));
        }

        let retained = mask.iter().filter(|&&keep| keep).count();
        debug!("Channel {}: kept {} of {} samples", channel, retained, num_rows);
        retention.push(ChannelRetention { channel, retained });
    }

    let table = NodeTable::from_columns(columns).map_err(|c| StationaryError::ColumnClash(c.name))?;

    let compressed = CompressedTable {
        table,
        downsampled_rows: num_rows,
        retention,
    };

    info!(
        "Stationary filter: {} -> {} rows, {} stationary samples blanked",
        cleaned.num_rows(),
        num_rows,
        compressed.dropped_samples()
    );

    Ok(compressed)
}
