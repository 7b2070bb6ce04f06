//! Positional merge of the projected bank A and bank B tables.

use log::{info, warn};
use thiserror::Error;

use crate::config::{BankAlignment, MergeConfig};
use crate::core::loaders::{Column, NodeTable};
use crate::core::schema::{Bank, TIME_COLUMN};

/// Errors that can occur while merging banks.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("bank row counts differ: bank A has {bank_a} rows, bank B has {bank_b}")]
    RowCountMismatch { bank_a: usize, bank_b: usize },

    #[error("bank {bank} table has no 'Time' column")]
    MissingTime { bank: Bank },

    #[error("column '{0}' appears in both banks")]
    DuplicateColumn(String),
}

fn truncated(column: &Column, len: usize) -> Column {
    Column::new(
        column.name.clone(),
        column.values.iter().take(len).cloned().collect(),
    )
}

/// Join bank B onto bank A by row position.
///
/// Row `n` of bank B pairs with row `n` of bank A regardless of the `Time`
/// values. The result keeps bank A's `Time` column followed by every other
/// column of A, then every column of B except its `Time`.
///
/// With `BankAlignment::Truncate` the shorter bank sets the row count and
/// the excess rows of the longer bank are dropped with a warning.
///
/// # Errors
///
/// Returns `MergeError::RowCountMismatch` when either bank has no rows, and
/// under `BankAlignment::Strict` whenever the banks differ in length.
pub fn merge_banks(
    bank_a: &NodeTable,
    bank_b: &NodeTable,
    config: &MergeConfig,
) -> Result<NodeTable, MergeError> {
    let (rows_a, rows_b) = (bank_a.num_rows(), bank_b.num_rows());

    if rows_a == 0 || rows_b == 0 {
        return Err(MergeError::RowCountMismatch {
            bank_a: rows_a,
            bank_b: rows_b,
        });
    }

    if rows_a != rows_b {
        match config.alignment {
            BankAlignment::Strict => {
                return Err(MergeError::RowCountMismatch {
                    bank_a: rows_a,
                    bank_b: rows_b,
                });
            }
            BankAlignment::Truncate => {
                warn!(
                    "Bank row counts differ (A: {}, B: {}); dropping {} trailing row(s) of bank {}",
                    rows_a,
                    rows_b,
                    rows_a.abs_diff(rows_b),
                    if rows_a > rows_b { Bank::A } else { Bank::B }
                );
            }
        }
    }

    let time = bank_a
        .column(TIME_COLUMN)
        .ok_or(MergeError::MissingTime { bank: Bank::A })?;
    if bank_b.column(TIME_COLUMN).is_none() {
        return Err(MergeError::MissingTime { bank: Bank::B });
    }

    let num_rows = rows_a.min(rows_b);
    let mut merged = NodeTable::with_rows(num_rows);

    let value_columns = bank_a
        .columns()
        .iter()
        .chain(bank_b.columns().iter())
        .filter(|c| c.name != TIME_COLUMN);

    for column in std::iter::once(time).chain(value_columns) {
        merged
            .push_column(truncated(column, num_rows))
            .map_err(|c| MergeError::DuplicateColumn(c.name))?;
    }

    info!(
        "Merged banks: {} rows x {} columns",
        merged.num_rows(),
        merged.num_columns()
    );

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(prefix: char, times: &[&str]) -> NodeTable {
        let values = |tag: &str| -> Vec<Option<String>> {
            (0..times.len()).map(|i| Some(format!("{tag}{i}"))).collect()
        };
        NodeTable::from_columns(vec![
            Column::new("Time", times.iter().map(|t| Some(t.to_string())).collect()),
            Column::new(format!("{prefix}Exp1"), values("e")),
            Column::new(format!("{prefix}Prim1"), values("p")),
        ])
        .unwrap()
    }

    #[test]
    fn test_merge_equal_lengths() {
        let a = bank('A', &["0.0", "0.1"]);
        let b = bank('B', &["9.0", "9.1"]);

        let merged = merge_banks(&a, &b, &MergeConfig::default()).unwrap();
        assert_eq!(merged.num_rows(), 2);
        assert_eq!(
            merged.column_names(),
            vec!["Time", "AExp1", "APrim1", "BExp1", "BPrim1"]
        );
        // bank A's time axis is kept, bank B's is dropped
        assert_eq!(merged.cell("Time", 1), Some("0.1"));
        assert_eq!(merged.cell("BPrim1", 1), Some("p1"));
    }

    #[test]
    fn test_merge_truncates_to_shorter_bank() {
        let a = bank('A', &["0.0", "0.1", "0.2"]);
        let b = bank('B', &["0.0", "0.1"]);

        let merged = merge_banks(&a, &b, &MergeConfig::default()).unwrap();
        assert_eq!(merged.num_rows(), 2);
        assert_eq!(merged.column("AExp1").unwrap().len(), 2);

        let merged = merge_banks(&b, &a, &MergeConfig::default()).unwrap();
        assert_eq!(merged.num_rows(), 2);
    }

    #[test]
    fn test_merge_strict_rejects_mismatch() {
        let a = bank('A', &["0.0", "0.1", "0.2"]);
        let b = bank('B', &["0.0"]);
        let config = MergeConfig {
            alignment: BankAlignment::Strict,
        };

        match merge_banks(&a, &b, &config) {
            Err(MergeError::RowCountMismatch { bank_a, bank_b }) => {
                assert_eq!(bank_a, 3);
                assert_eq!(bank_b, 1);
            }
            other => panic!("Expected RowCountMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_rejects_empty_bank_when_truncating() {
        let a = bank('A', &["0.0", "0.1"]);
        let b = bank('B', &[]);

        match merge_banks(&a, &b, &MergeConfig::default()) {
            Err(MergeError::RowCountMismatch { bank_a, bank_b }) => {
                assert_eq!(bank_a, 2);
                assert_eq!(bank_b, 0);
            }
            other => panic!("Expected RowCountMismatch error, got {other:?}"),
        }
        assert!(merge_banks(&b, &a, &MergeConfig::default()).is_err());
    }

    #[test]
    fn test_merge_rejects_same_bank_twice() {
        let a = bank('A', &["0.0"]);
        let result = merge_banks(&a, &a, &MergeConfig::default());
        assert!(matches!(result, Err(MergeError::DuplicateColumn(name)) if name == "AExp1"));
    }
}
