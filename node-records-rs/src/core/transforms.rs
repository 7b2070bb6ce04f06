//! Row-level transformations on node tables.
//!
//! This module provides the building blocks of the stationary-sample filter:
//! value comparison between cells, row downsampling, and per-series
//! change detection.

use super::loaders::{Column, NodeTable};

/// Compare two cells for change detection.
///
/// Both cells parse as `f64`: numeric comparison, so `1.0` equals `1`.
/// Otherwise the trimmed text must match exactly. Missing cells, including
/// empty or blank fields, never compare equal, not even to each other.
pub fn values_equal(a: Option<&str>, b: Option<&str>) -> bool {
    let (Some(a), Some(b)) = (present(a), present(b)) else {
        return false;
    };
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

/// Trimmed cell text, or `None` for a missing or blank cell.
fn present(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|v| !v.is_empty())
}

/// Row positions kept when taking every `factor`-th row starting at 0.
///
/// A factor of 0 is treated as 1.
pub fn downsample_indices(num_rows: usize, factor: usize) -> Vec<usize> {
    (0..num_rows).step_by(factor.max(1)).collect()
}

/// Keep every `factor`-th row of a table, starting at row 0.
pub fn downsample_table(table: &NodeTable, factor: usize) -> NodeTable {
    table.select_rows(&downsample_indices(table.num_rows(), factor))
}

/// Mark which samples of a series survive the stationary filter.
///
/// A sample is dropped when it equals the most recent kept sample. The first
/// sample is always kept.
///
/// # Example
///
/// ```ignore
/// let series = [Some("1.0"), Some("1.0"), Some("2.0"), Some("2")];
/// assert_eq!(stationary_keep_mask(&series), vec![true, false, true, false]);
/// ```
pub fn stationary_keep_mask(series: &[Option<&str>]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(series.len());
    let mut last_kept: Option<Option<&str>> = None;

    for &value in series {
        let keep = match last_kept {
            Some(prev) => !values_equal(prev, value),
            None => true,
        };
        if keep {
            last_kept = Some(value);
        }
        mask.push(keep);
    }

    mask
}

/// Blank out cells of a column where `mask` is false.
pub fn apply_keep_mask(column: &Column, mask: &[bool]) -> Column {
    let values = column
        .values
        .iter()
        .zip(mask.iter())
        .map(|(value, &keep)| if keep { value.clone() } else { None })
        .collect();
    Column::new(column.name.clone(), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, values: &[&str]) -> Column {
        Column::new(name, values.iter().map(|v| Some(v.to_string())).collect())
    }

    #[test]
    fn test_values_equal_numeric() {
        assert!(values_equal(Some("1.0"), Some("1")));
        assert!(values_equal(Some(" 2.50"), Some("2.5 ")));
        assert!(!values_equal(Some("1.0"), Some("1.01")));
    }

    #[test]
    fn test_values_equal_text_and_missing() {
        assert!(values_equal(Some("abc"), Some("abc")));
        assert!(!values_equal(Some("abc"), Some("abd")));
        assert!(!values_equal(None, None));
        assert!(!values_equal(Some("1"), None));
    }

    #[test]
    fn test_blank_cells_are_missing() {
        assert!(!values_equal(Some(""), Some("")));
        assert!(!values_equal(Some("  "), Some("")));
        assert!(!values_equal(Some(""), None));
        assert!(!values_equal(Some("0"), Some(" ")));
    }

    #[test]
    fn test_downsample_indices() {
        assert_eq!(downsample_indices(5, 2), vec![0, 2, 4]);
        assert_eq!(downsample_indices(4, 2), vec![0, 2]);
        assert_eq!(downsample_indices(3, 1), vec![0, 1, 2]);
        assert_eq!(downsample_indices(3, 0), vec![0, 1, 2]);
        assert!(downsample_indices(0, 2).is_empty());
    }

    #[test]
    fn test_downsample_table() {
        let table = NodeTable::from_columns(vec![
            col("Time", &["0", "1", "2", "3", "4"]),
            col("AExp1", &["a", "b", "c", "d", "e"]),
        ])
        .unwrap();

        let out = downsample_table(&table, 2);
        assert_eq!(out.num_rows(), 3);
        assert_eq!(out.num_columns(), 2);
        assert_eq!(out.cell("AExp1", 1), Some("c"));
        assert_eq!(out.cell("Time", 2), Some("4"));
    }

    #[test]
    fn test_stationary_keep_mask() {
        let series = [Some("1.0"), Some("1.0"), Some("2.0"), Some("2"), Some("1.0")];
        assert_eq!(
            stationary_keep_mask(&series),
            vec![true, false, true, false, true]
        );
    }

    #[test]
    fn test_stationary_keep_mask_compares_to_last_kept() {
        // a run of equal samples collapses to its first sample
        let series = [Some("3"), Some("3"), Some("3"), Some("4")];
        assert_eq!(stationary_keep_mask(&series), vec![true, false, false, true]);
    }

    #[test]
    fn test_stationary_keep_mask_missing_cells_kept() {
        let series = [None, None, Some("1")];
        assert_eq!(stationary_keep_mask(&series), vec![true, true, true]);
        assert!(stationary_keep_mask(&[]).is_empty());
    }

    #[test]
    fn test_stationary_keep_mask_blank_cells_kept() {
        let series = [Some(""), Some(""), Some(" "), Some("1"), Some("1")];
        assert_eq!(
            stationary_keep_mask(&series),
            vec![true, true, true, true, false]
        );
    }

    #[test]
    fn test_apply_keep_mask() {
        let column = col("AExp1", &["1", "1", "2"]);
        let masked = apply_keep_mask(&column, &[true, false, true]);
        assert_eq!(masked.values, vec![Some("1".into()), None, Some("2".into())]);
        assert_eq!(masked.name, "AExp1");
    }
}
