//! Column projection and bank-specific renaming.
//!
//! Each bank block is reduced to `Time` plus the 180 channel columns in
//! canonical order, renamed `{Bank}{Kind}{Leaf}`. Columns are selected by
//! label, so unrelated columns in the file (e.g. `CarExp`) are dropped.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use super::splitting::Block;
use crate::core::loaders::{Column, NodeTable};
use crate::core::schema::{bank_column_name, raw_channel_columns, Bank, TIME_COLUMN};

/// Errors that can occur during projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("bank {bank}: missing column 'Time'")]
    MissingTime { bank: Bank },

    #[error("bank {bank}: missing column '{column}' for leaf {leaf} ({total} expected column(s) absent)")]
    MissingColumn {
        bank: Bank,
        column: String,
        leaf: usize,
        total: usize,
    },

    #[error("bank {bank}: duplicate output column '{column}'")]
    DuplicateColumn { bank: Bank, column: String },
}

impl ProjectionError {
    /// Leaf index of the first missing channel column, if any.
    pub fn leaf(&self) -> Option<usize> {
        match self {
            ProjectionError::MissingColumn { leaf, .. } => Some(*leaf),
            _ => None,
        }
    }
}

/// Output column name paired with its source position in the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumn {
    pub name: String,
    pub source: usize,
}

/// Resolve the `Time` and channel columns of a bank against header labels.
///
/// A channel column is found under its raw label (`Prim37`) or its
/// bank-prefixed label (`BPrim37`), so a table that was already projected
/// resolves to the same selection. The first occurrence of a label wins.
pub fn resolve_columns(headers: &[String], bank: Bank) -> Result<Vec<SelectedColumn>, ProjectionError> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(headers.len());
    for (i, label) in headers.iter().enumerate() {
        positions.entry(label.as_str()).or_insert(i);
    }

    let time = positions
        .get(TIME_COLUMN)
        .copied()
        .ok_or(ProjectionError::MissingTime { bank })?;

    let channels = raw_channel_columns();
    let mut selected = Vec::with_capacity(channels.len() + 1);
    selected.push(SelectedColumn {
        name: TIME_COLUMN.to_string(),
        source: time,
    });

    let mut missing: Vec<(String, usize)> = Vec::new();
    for (kind, leaf, raw) in channels {
        let renamed = bank_column_name(bank, kind, leaf);
        let source = positions
            .get(raw.as_str())
            .or_else(|| positions.get(renamed.as_str()))
            .copied();

        match source {
            Some(source) => selected.push(SelectedColumn {
                name: renamed,
                source,
            }),
            None => missing.push((raw, leaf)),
        }
    }

    if let Some((column, leaf)) = missing.first().cloned() {
        return Err(ProjectionError::MissingColumn {
            bank,
            column,
            leaf,
            total: missing.len(),
        });
    }

    Ok(selected)
}

/// Project one bank block onto `Time` plus its renamed channel columns.
///
/// For bank B the block's first row, a repeated header line, is discarded
/// before selection. Cells beyond the end of a short row are missing.
///
/// # Errors
///
/// Returns `ProjectionError` naming the first absent column and its leaf.
pub fn project_block(block: &Block<'_>, bank: Bank) -> Result<NodeTable, ProjectionError> {
    let data = match bank {
        Bank::A => *block,
        Bank::B => block.skip_rows(1),
    };

    let selected = resolve_columns(data.headers, bank)?;
    let mut table = NodeTable::with_rows(data.len());

    for SelectedColumn { name, source } in selected {
        let values = data
            .rows
            .iter()
            .map(|row| row.get(source).cloned())
            .collect();
        table
            .push_column(Column::new(name, values))
            .map_err(|column| ProjectionError::DuplicateColumn {
                bank,
                column: column.name,
            })?;
    }

    debug!(
        "Projected bank {}: {} rows x {} columns",
        bank,
        table.num_rows(),
        table.num_columns()
    );

    Ok(table)
}
