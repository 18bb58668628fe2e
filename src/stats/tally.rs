//! Per-nutrient outcome tally

use crate::models::{ComparisonOutcome, Nutrient, NutrientValue};
use crate::scoring::{compare_one, round2, ScoringError, ScoringResult, Tolerance};
use serde::Serialize;

/// Outcome counts of one nutrient over a batch.
///
/// Both kinds of absence collapse to `Unavailable` in a product record but
/// are counted apart here. Missing ground truth wins when both are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub ground_truth_missing: usize,
    pub prediction_missing: usize,
}

impl OutcomeCounts {
    /// Count one (ground truth, prediction) pair
    pub fn record(
        &mut self,
        nutrient: Nutrient,
        ground_truth: NutrientValue,
        predicted: NutrientValue,
        tolerance: Tolerance,
    ) {
        if ground_truth.is_none() {
            self.ground_truth_missing += 1;
            return;
        }
        if predicted.is_none() {
            self.prediction_missing += 1;
            return;
        }
        match compare_one(nutrient, predicted, ground_truth, tolerance) {
            ComparisonOutcome::Correct => self.correct += 1,
            ComparisonOutcome::Incorrect => self.incorrect += 1,
            // unreachable with both values present
            ComparisonOutcome::Unavailable => self.prediction_missing += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.ground_truth_missing + self.prediction_missing
    }

    /// Share of ground-truth-bearing cases that got a prediction:
    /// `(correct + incorrect) / (correct + incorrect + prediction_missing)`
    pub fn detectability(&self, nutrient: Nutrient) -> ScoringResult<f64> {
        let predicted = self.correct + self.incorrect;
        ratio(predicted, predicted + self.prediction_missing).ok_or(
            ScoringError::NotComputable {
                metric: "detectability",
                nutrient,
            },
        )
    }

    /// Share of produced predictions that were correct:
    /// `correct / (correct + incorrect)`
    pub fn accuracy(&self, nutrient: Nutrient) -> ScoringResult<f64> {
        ratio(self.correct, self.correct + self.incorrect).ok_or(ScoringError::NotComputable {
            metric: "accuracy",
            nutrient,
        })
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| round2(numerator as f64 / denominator as f64))
}
