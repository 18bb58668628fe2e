//! Product and batch scores

use super::{ScoringError, ScoringResult};
use crate::models::{ComparisonOutcome, ProductOutcomeRecord};
use serde::Serialize;

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 1 if no nutrient is `Incorrect`, else 0.
///
/// `Unavailable` entries do not disqualify the product.
pub fn score_all_correct(record: &ProductOutcomeRecord) -> ScoringResult<u8> {
    if record.is_empty() {
        return Err(ScoringError::EmptyInput("all_correct"));
    }
    let any_incorrect = record
        .iter()
        .any(|(_, outcome)| outcome == ComparisonOutcome::Incorrect);
    Ok(if any_incorrect { 0 } else { 1 })
}

/// Share of `Correct` among determinate entries, rounded to 2 decimals.
///
/// 0.0 when every entry is `Unavailable`.
pub fn score_fraction_correct(record: &ProductOutcomeRecord) -> ScoringResult<f64> {
    if record.is_empty() {
        return Err(ScoringError::EmptyInput("fraction_correct"));
    }
    let determinate = record.determinate_count();
    if determinate == 0 {
        return Ok(0.0);
    }
    let correct = record.count(ComparisonOutcome::Correct);
    Ok(round2(correct as f64 / determinate as f64))
}

/// Both product scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub all_correct: u8,
    pub fraction_correct: f64,
}

pub fn score_record(record: &ProductOutcomeRecord) -> ScoringResult<ScoreSummary> {
    Ok(ScoreSummary {
        all_correct: score_all_correct(record)?,
        fraction_correct: score_fraction_correct(record)?,
    })
}

/// Product scores averaged over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchScores {
    pub products: usize,
    /// Products scoring `all_correct == 1`
    pub all_correct: usize,
    /// `all_correct / products`, rounded to 2 decimals
    pub all_correct_rate: f64,
    /// Mean `fraction_correct`, rounded to 2 decimals
    pub mean_fraction_correct: f64,
}

impl BatchScores {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a ProductOutcomeRecord>,
    ) -> ScoringResult<Self> {
        let mut products = 0usize;
        let mut all_correct = 0usize;
        let mut fraction_sum = 0.0;

        for record in records {
            let summary = score_record(record)?;
            products += 1;
            all_correct += summary.all_correct as usize;
            fraction_sum += summary.fraction_correct;
        }

        if products == 0 {
            return Ok(Self::default());
        }

        Ok(Self {
            products,
            all_correct,
            all_correct_rate: round2(all_correct as f64 / products as f64),
            mean_fraction_correct: round2(fraction_sum / products as f64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrient;
    use ComparisonOutcome::*;

    fn record(outcomes: &[(Nutrient, ComparisonOutcome)]) -> ProductOutcomeRecord {
        ProductOutcomeRecord::from_outcomes("p", outcomes.iter().copied())
    }

    #[test]
    fn test_mixed_record() {
        let r = record(&[
            (Nutrient::Energy, Correct),
            (Nutrient::Protein, Incorrect),
            (Nutrient::Sugar, Unavailable),
        ]);
        assert_eq!(score_all_correct(&r).unwrap(), 0);
        assert_eq!(score_fraction_correct(&r).unwrap(), 0.5);
    }

    #[test]
    fn test_all_correct_record() {
        let r = record(&[(Nutrient::Energy, Correct), (Nutrient::Protein, Correct)]);
        assert_eq!(score_all_correct(&r).unwrap(), 1);
        assert_eq!(score_fraction_correct(&r).unwrap(), 1.0);
    }

    #[test]
    fn test_unavailable_does_not_disqualify() {
        let r = record(&[(Nutrient::Fat, Correct), (Nutrient::Fiber, Unavailable)]);
        assert_eq!(score_all_correct(&r).unwrap(), 1);
        assert_eq!(score_fraction_correct(&r).unwrap(), 1.0);
    }

    #[test]
    fn test_all_unavailable() {
        let r = record(&[(Nutrient::Fat, Unavailable), (Nutrient::Salt, Unavailable)]);
        assert_eq!(score_all_correct(&r).unwrap(), 1);
        assert_eq!(score_fraction_correct(&r).unwrap(), 0.0);
    }

    #[test]
    fn test_fraction_rounding() {
        let r = record(&[
            (Nutrient::Energy, Correct),
            (Nutrient::Protein, Incorrect),
            (Nutrient::Fat, Incorrect),
        ]);
        assert_eq!(score_fraction_correct(&r).unwrap(), 0.33);
    }

    #[test]
    fn test_empty_record_fails() {
        let r = record(&[]);
        assert_eq!(
            score_all_correct(&r),
            Err(ScoringError::EmptyInput("all_correct"))
        );
        assert_eq!(
            score_fraction_correct(&r),
            Err(ScoringError::EmptyInput("fraction_correct"))
        );
        assert!(score_record(&r).is_err());
    }

    #[test]
    fn test_batch_scores() {
        let records = vec![
            record(&[(Nutrient::Energy, Correct), (Nutrient::Protein, Correct)]),
            record(&[(Nutrient::Energy, Correct), (Nutrient::Protein, Incorrect)]),
            record(&[(Nutrient::Energy, Unavailable), (Nutrient::Protein, Unavailable)]),
        ];
        let scores = BatchScores::from_records(&records).unwrap();
        assert_eq!(scores.products, 3);
        assert_eq!(scores.all_correct, 2);
        assert_eq!(scores.all_correct_rate, 0.67);
        assert_eq!(scores.mean_fraction_correct, 0.5);
    }

    #[test]
    fn test_batch_scores_empty_batch() {
        let scores = BatchScores::from_records(std::iter::empty()).unwrap();
        assert_eq!(scores, BatchScores::default());
    }
}
