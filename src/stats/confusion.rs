//! Mismatch heat-map per nutrient
//!
//! Amounts are bucketed to whole grams 0-20. Each mismatching pair
//! decrements its `(truth, predicted)` cell, so matching cells stay at 0 and
//! stand out against the negative error field.

use crate::models::NutrientValue;
use serde::Serialize;

/// Highest gram bucket; predictions above it are clamped
pub const MAX_BUCKET: usize = 20;

/// Side of the matrix
pub const SIZE: usize = MAX_BUCKET + 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// `cells[truth][predicted]`, zero or negative
    cells: Vec<Vec<i64>>,
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self {
            cells: vec![vec![0; SIZE]; SIZE],
        }
    }
}

impl ConfusionMatrix {
    /// Account for one pair.
    ///
    /// Ignored unless both values are present, the ground truth lies in
    /// `[0, 20]` and the raw values differ.
    pub fn record(&mut self, ground_truth: NutrientValue, predicted: NutrientValue) {
        let (Some(truth), Some(predicted)) = (ground_truth, predicted) else {
            return;
        };
        if !(0.0..=MAX_BUCKET as f64).contains(&truth) || predicted < 0.0 {
            return;
        }
        if truth == predicted {
            return;
        }
        let row = truth.floor() as usize;
        let col = (predicted.floor() as usize).min(MAX_BUCKET);
        self.cells[row][col] -= 1;
    }

    pub fn get(&self, truth: usize, predicted: usize) -> i64 {
        self.cells
            .get(truth)
            .and_then(|r| r.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    pub fn cells(&self) -> &[Vec<i64>] {
        &self.cells
    }

    /// Most negative cell value (0 when there are no mismatches)
    pub fn min(&self) -> i64 {
        self.cells.iter().flatten().copied().min().unwrap_or(0)
    }

    /// Total number of recorded mismatches
    pub fn mismatches(&self) -> u64 {
        self.cells.iter().flatten().map(|c| c.unsigned_abs()).sum()
    }

    /// The `n` most frequent mismatches as `(truth, predicted, count)`,
    /// most frequent first
    pub fn top_mismatches(&self, n: usize) -> Vec<(usize, usize, u64)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .enumerate()
            .flat_map(|(t, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, c)| **c < 0)
                    .map(move |(p, c)| (t, p, c.unsigned_abs()))
            })
            .collect();
        cells.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
        cells.truncate(n);
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_decrements_cell() {
        let mut m = ConfusionMatrix::default();
        m.record(Some(3.4), Some(5.9));
        m.record(Some(3.0), Some(5.0));
        assert_eq!(m.get(3, 5), -2);
        assert_eq!(m.min(), -2);
        assert_eq!(m.mismatches(), 2);
    }

    #[test]
    fn test_equal_values_untouched() {
        let mut m = ConfusionMatrix::default();
        m.record(Some(4.0), Some(4.0));
        assert_eq!(m.mismatches(), 0);
        assert_eq!(m.min(), 0);
    }

    #[test]
    fn test_same_bucket_mismatch_hits_diagonal() {
        let mut m = ConfusionMatrix::default();
        m.record(Some(4.2), Some(4.8));
        assert_eq!(m.get(4, 4), -1);
    }

    #[test]
    fn test_prediction_clamped_truth_filtered() {
        let mut m = ConfusionMatrix::default();
        m.record(Some(20.0), Some(85.0));
        m.record(Some(21.0), Some(2.0));
        m.record(None, Some(2.0));
        m.record(Some(2.0), None);
        assert_eq!(m.get(20, 20), -1);
        assert_eq!(m.mismatches(), 1);
        assert_eq!(m.cells().len(), SIZE);
    }

    #[test]
    fn test_top_mismatches_order() {
        let mut m = ConfusionMatrix::default();
        m.record(Some(1.0), Some(2.0));
        m.record(Some(5.0), Some(7.0));
        m.record(Some(5.0), Some(7.5));
        let top = m.top_mismatches(5);
        assert_eq!(top, vec![(5, 7, 2), (1, 2, 1)]);
        assert_eq!(m.top_mismatches(1).len(), 1);
    }
}
