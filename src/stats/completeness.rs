//! Completeness vs veracity histogram
//!
//! Rows are the number of nutrients a product could be judged on (both
//! values present, 0..=8); columns split products whose judged nutrients
//! were all correct from the rest.

use crate::models::{ComparisonOutcome, Nutrient, ProductOutcomeRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessHistogram {
    /// Indexed by state; `[all correct, some incorrect]`
    rows: Vec<[usize; 2]>,
}

impl Default for CompletenessHistogram {
    fn default() -> Self {
        Self {
            rows: vec![[0; 2]; Nutrient::COUNT + 1],
        }
    }
}

impl CompletenessHistogram {
    pub fn record(&mut self, record: &ProductOutcomeRecord) {
        let state = record.determinate_count().min(Nutrient::COUNT);
        let column = if record.count(ComparisonOutcome::Incorrect) == 0 {
            0
        } else {
            1
        };
        self.rows[state][column] += 1;
    }

    /// Products with `state` judged nutrients whose judgements were all correct
    pub fn correct(&self, state: usize) -> usize {
        self.rows.get(state).map_or(0, |r| r[0])
    }

    /// Products with `state` judged nutrients and at least one incorrect judgement
    pub fn incorrect(&self, state: usize) -> usize {
        self.rows.get(state).map_or(0, |r| r[1])
    }

    /// `(state, correct, incorrect)`, highest state first
    pub fn rows(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .rev()
            .map(|(state, [c, i])| (state, *c, *i))
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|[c, i]| c + i).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComparisonOutcome::*;

    #[test]
    fn test_histogram_shape_and_counts() {
        let mut hist = CompletenessHistogram::default();
        hist.record(&ProductOutcomeRecord::from_outcomes(
            "a",
            [(Nutrient::Energy, Correct), (Nutrient::Fat, Correct), (Nutrient::Salt, Unavailable)],
        ));
        hist.record(&ProductOutcomeRecord::from_outcomes(
            "b",
            [(Nutrient::Energy, Correct), (Nutrient::Fat, Incorrect)],
        ));
        hist.record(&ProductOutcomeRecord::from_outcomes(
            "c",
            [(Nutrient::Energy, Unavailable)],
        ));

        assert_eq!(hist.rows().count(), 9);
        assert_eq!(hist.correct(2), 1);
        assert_eq!(hist.incorrect(2), 1);
        // nothing judged counts as vacuously correct
        assert_eq!(hist.correct(0), 1);
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.rows().next(), Some((8, 0, 0)));
        assert_eq!(hist.correct(42), 0);
    }
}
