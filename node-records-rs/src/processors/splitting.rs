//! Splitting a node record file into marker-delimited bank blocks.

use log::{info, warn};
use thiserror::Error;

use crate::config::{BlockConfig, ExtraBlocks};
use crate::core::loaders::RawTable;

/// Errors that can occur while splitting a file into blocks.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("found {found} block(s) delimited by '{prefix}' marker rows; banks A and B need 2")]
    TooFewBlocks { prefix: String, found: usize },

    #[error("found {found} blocks delimited by '{prefix}' marker rows; only banks A and B are supported")]
    TooManyBlocks { prefix: String, found: usize },
}

/// A contiguous row range of a `RawTable`.
///
/// Every block shares the file's header labels. Blocks after the first
/// start at their marker row.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    /// Position of this block in the file
    pub index: usize,
    /// Row offset of the first row in the source table
    pub start: usize,
    pub headers: &'a [String],
    pub rows: &'a [Vec<String>],
}

impl<'a> Block<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exclusive end row in the source table.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.rows.len()
    }

    /// The same block without its first `n` rows.
    pub fn skip_rows(&self, n: usize) -> Block<'a> {
        let n = n.min(self.rows.len());
        Block {
            index: self.index,
            start: self.start + n,
            headers: self.headers,
            rows: &self.rows[n..],
        }
    }
}

/// The two bank blocks of a file.
#[derive(Debug, Clone, Copy)]
pub struct BankBlocks<'a> {
    pub bank_a: Block<'a>,
    pub bank_b: Block<'a>,
    /// Blocks found after bank B and left unused
    pub ignored: usize,
}

/// Whether a row starts a new block: its first cell begins with `prefix`.
pub fn is_marker_row(row: &[String], prefix: &str) -> bool {
    row.first().is_some_and(|cell| cell.starts_with(prefix))
}

/// Row indices where blocks begin.
///
/// Row 0 is always a boundary. A marker on row 0 does not add a second,
/// empty block.
pub fn find_block_boundaries(table: &RawTable, prefix: &str) -> Vec<usize> {
    let mut boundaries = vec![0];
    boundaries.extend(
        table
            .rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, row)| is_marker_row(row, prefix))
            .map(|(i, _)| i),
    );
    boundaries
}

/// Partition a table into blocks at every marker row.
///
/// The last block runs to the end of the table.
pub fn split_blocks<'a>(table: &'a RawTable, prefix: &str) -> Vec<Block<'a>> {
    let boundaries = find_block_boundaries(table, prefix);
    let mut blocks = Vec::with_capacity(boundaries.len());

    for (index, &start) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(index + 1)
            .copied()
            .unwrap_or(table.rows.len());
        blocks.push(Block {
            index,
            start,
            headers: &table.headers,
            rows: &table.rows[start..end],
        });
    }

    blocks
}

/// Split a table into the bank A and bank B blocks.
///
/// # Errors
///
/// Returns `SplitError::TooFewBlocks` when no marker row separates the two
/// banks, and `SplitError::TooManyBlocks` when more than two blocks exist and
/// the config rejects them.
pub fn split_banks<'a>(table: &'a RawTable, config: &BlockConfig) -> Result<BankBlocks<'a>, SplitError> {
    let prefix = config.marker_prefix.as_str();
    let blocks = split_blocks(table, prefix);

    if blocks.len() < 2 {
        return Err(SplitError::TooFewBlocks {
            prefix: prefix.to_string(),
            found: blocks.len(),
        });
    }

    let ignored = blocks.len() - 2;
    if ignored > 0 {
        match config.extra_blocks {
            ExtraBlocks::Reject => {
                return Err(SplitError::TooManyBlocks {
                    prefix: prefix.to_string(),
                    found: blocks.len(),
                });
            }
            ExtraBlocks::Ignore => {
                warn!(
                    "Found {} blocks, ignoring {} after bank B (rows {}..{})",
                    blocks.len(),
                    ignored,
                    blocks[2].start,
                    table.rows.len()
                );
            }
        }
    }

    let bank_a = blocks[0];
    let bank_b = blocks[1];
    info!(
        "Split {} rows: bank A rows {}..{}, bank B rows {}..{}",
        table.rows.len(),
        bank_a.start,
        bank_a.end(),
        bank_b.start,
        bank_b.end()
    );

    Ok(BankBlocks {
        bank_a,
        bank_b,
        ignored,
    })
}
