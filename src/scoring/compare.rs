//! Unit and record comparators

use super::{ScoringError, ScoringResult};
use crate::config::NutrientTable;
use crate::models::{
    present, value_of, ComparisonOutcome, Nutrient, NutrientValue, NutrientValues,
    ProductOutcomeRecord,
};
use serde::Serialize;
use std::str::FromStr;

/// Relative tolerance used when none is configured
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Energy is matched on an absolute band (kcal), whatever its magnitude
pub const ENERGY_ABSOLUTE_TOLERANCE: f64 = 1.0;

/// Relative tolerance band, a fraction in `[0, 1)`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(value: f64) -> ScoringResult<Self> {
        if value.is_finite() && (0.0..1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoringError::Configuration(format!(
                "tolerance must be in [0, 1), got {}",
                value
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl FromStr for Tolerance {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| {
            ScoringError::Configuration(format!("'{}' is not a valid tolerance", s))
        })?;
        Self::new(value)
    }
}

impl std::fmt::Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compare one predicted amount with its ground truth.
///
/// Both values must already be in the same unit (kcal for energy, grams
/// otherwise).
pub fn compare_one(
    nutrient: Nutrient,
    predicted: NutrientValue,
    ground_truth: NutrientValue,
    tolerance: Tolerance,
) -> ComparisonOutcome {
    let (Some(predicted), Some(truth)) = (present(predicted), present(ground_truth)) else {
        return ComparisonOutcome::Unavailable;
    };

    let correct = match nutrient {
        Nutrient::Energy => (predicted - truth).abs() <= ENERGY_ABSOLUTE_TOLERANCE,
        _ => {
            let tol = tolerance.value();
            truth * (1.0 - tol) <= predicted && predicted <= truth * (1.0 + tol)
        }
    };

    if correct {
        ComparisonOutcome::Correct
    } else {
        ComparisonOutcome::Incorrect
    }
}

/// Compare every nutrient of the table for one product.
///
/// Keys outside the table are ignored; nutrients missing from a map are
/// treated as absent.
pub fn compare_record(
    code: &str,
    table: &NutrientTable,
    predicted: &NutrientValues,
    ground_truth: &NutrientValues,
    tolerance: Tolerance,
) -> ScoringResult<ProductOutcomeRecord> {
    if table.is_empty() {
        return Err(ScoringError::Configuration(
            "nutrient table is empty".to_string(),
        ));
    }

    let outcomes = table.nutrients().map(|nutrient| {
        let outcome = compare_one(
            nutrient,
            value_of(predicted, nutrient),
            value_of(ground_truth, nutrient),
            tolerance,
        );
        (nutrient, outcome)
    });

    Ok(ProductOutcomeRecord::from_outcomes(code, outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComparisonOutcome::*;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn test_within_tolerance_is_correct() {
        assert_eq!(compare_one(Nutrient::Protein, Some(105.0), Some(100.0), tol()), Correct);
        assert_eq!(compare_one(Nutrient::Protein, Some(95.0), Some(100.0), tol()), Correct);
    }

    #[test]
    fn test_outside_tolerance_is_incorrect() {
        assert_eq!(compare_one(Nutrient::Protein, Some(120.0), Some(100.0), tol()), Incorrect);
        assert_eq!(compare_one(Nutrient::Sugar, Some(8.0), Some(10.0), tol()), Incorrect);
    }

    #[test]
    fn test_band_edges_inclusive() {
        assert_eq!(compare_one(Nutrient::Fat, Some(90.0), Some(100.0), tol()), Correct);
        assert_eq!(compare_one(Nutrient::Fat, Some(110.0), Some(100.0), tol()), Correct);
    }

    #[test]
    fn test_absent_value_is_unavailable() {
        assert_eq!(compare_one(Nutrient::Fat, None, Some(50.0), tol()), Unavailable);
        assert_eq!(compare_one(Nutrient::Fat, Some(50.0), None, tol()), Unavailable);
        assert_eq!(compare_one(Nutrient::Energy, None, None, tol()), Unavailable);
        // legacy sentinel
        assert_eq!(compare_one(Nutrient::Fat, Some(-1.0), Some(50.0), tol()), Unavailable);
    }

    #[test]
    fn test_energy_uses_absolute_band() {
        assert_eq!(compare_one(Nutrient::Energy, Some(251.0), Some(250.0), tol()), Correct);
        assert_eq!(compare_one(Nutrient::Energy, Some(249.0), Some(250.0), tol()), Correct);
        // within 10% but more than 1 kcal away
        assert_eq!(compare_one(Nutrient::Energy, Some(260.0), Some(250.0), tol()), Incorrect);
        // tiny magnitudes still get the full 1 kcal band
        assert_eq!(compare_one(Nutrient::Energy, Some(1.5), Some(0.5), tol()), Correct);
    }

    #[test]
    fn test_zero_truth_requires_exact_zero() {
        assert_eq!(compare_one(Nutrient::Fiber, Some(0.0), Some(0.0), tol()), Correct);
        assert_eq!(compare_one(Nutrient::Fiber, Some(0.1), Some(0.0), tol()), Incorrect);
    }

    #[test]
    fn test_relative_property_holds_across_range() {
        for truth in [0.5, 1.0, 3.3, 12.0, 47.5, 100.0] {
            for factor in [0.5, 0.85, 0.92, 1.0, 1.08, 1.15, 2.0] {
                let predicted = truth * factor;
                let expected = if (0.9..=1.1).contains(&factor) { Correct } else { Incorrect };
                assert_eq!(
                    compare_one(Nutrient::Carbohydrate, Some(predicted), Some(truth), tol()),
                    expected,
                    "truth={} predicted={}",
                    truth,
                    predicted
                );
            }
        }
    }

    #[test]
    fn test_custom_tolerance() {
        let strict = Tolerance::new(0.0).unwrap();
        assert_eq!(compare_one(Nutrient::Salt, Some(1.01), Some(1.0), strict), Incorrect);
        let loose = Tolerance::new(0.5).unwrap();
        assert_eq!(compare_one(Nutrient::Salt, Some(1.4), Some(1.0), loose), Correct);
    }

    #[test]
    fn test_tolerance_range() {
        assert!(Tolerance::new(1.0).is_err());
        assert!(Tolerance::new(-0.1).is_err());
        assert!(Tolerance::new(f64::NAN).is_err());
        assert_eq!("0.25".parse::<Tolerance>().unwrap().value(), 0.25);
        assert!("abc".parse::<Tolerance>().is_err());
    }

    #[test]
    fn test_compare_record_one_outcome_per_nutrient() {
        let table = NutrientTable::default();
        let mut predicted = NutrientValues::new();
        predicted.insert(Nutrient::Energy, Some(250.0));
        predicted.insert(Nutrient::Protein, Some(12.0));
        let mut truth = NutrientValues::new();
        truth.insert(Nutrient::Energy, Some(250.0));
        truth.insert(Nutrient::Protein, Some(8.0));
        truth.insert(Nutrient::Fat, Some(3.0));

        let record = compare_record("3228857000852", &table, &predicted, &truth, tol()).unwrap();
        assert_eq!(record.len(), Nutrient::COUNT);
        assert_eq!(record.get(Nutrient::Energy), Some(Correct));
        assert_eq!(record.get(Nutrient::Protein), Some(Incorrect));
        assert_eq!(record.get(Nutrient::Fat), Some(Unavailable));
        assert_eq!(record.get(Nutrient::Fiber), Some(Unavailable));
    }

    #[test]
    fn test_compare_record_respects_table() {
        let mut table = NutrientTable::default();
        table.remove(Nutrient::Energy);
        let values: NutrientValues = [(Nutrient::Energy, Some(1.0))].into_iter().collect();
        let record = compare_record("1", &table, &values, &values, tol()).unwrap();
        assert_eq!(record.len(), Nutrient::COUNT - 1);
        assert_eq!(record.get(Nutrient::Energy), None);
    }

    #[test]
    fn test_compare_record_empty_table_fails() {
        let values = NutrientValues::new();
        let err = compare_record("1", &NutrientTable::empty(), &values, &values, tol())
            .unwrap_err();
        assert!(matches!(err, ScoringError::Configuration(_)));
    }

    #[test]
    fn test_compare_record_is_deterministic() {
        let table = NutrientTable::default();
        let predicted: NutrientValues = Nutrient::all()
            .iter()
            .enumerate()
            .map(|(i, n)| (*n, Some(i as f64 * 1.05)))
            .collect();
        let truth: NutrientValues = Nutrient::all()
            .iter()
            .enumerate()
            .map(|(i, n)| (*n, Some(i as f64)))
            .collect();
        let a = compare_record("7", &table, &predicted, &truth, tol()).unwrap();
        let b = compare_record("7", &table, &predicted, &truth, tol()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
