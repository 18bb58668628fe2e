//! Core data models for nutrient-eval
//!
//! These models are shared by the comparison core, the batch statistics
//! and the reporters: nutrients, per-nutrient outcomes, per-product
//! outcome records and the numeric rows of the persisted result table.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A nutrient from the fixed evaluation set.
///
/// Variant order is the reporting order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Energy,
    Protein,
    Carbohydrate,
    Sugar,
    Salt,
    Fat,
    SaturatedFat,
    Fiber,
}

impl Nutrient {
    /// Number of nutrients in the evaluation set
    pub const COUNT: usize = 8;

    pub fn all() -> &'static [Nutrient] {
        &[
            Nutrient::Energy,
            Nutrient::Protein,
            Nutrient::Carbohydrate,
            Nutrient::Sugar,
            Nutrient::Salt,
            Nutrient::Fat,
            Nutrient::SaturatedFat,
            Nutrient::Fiber,
        ]
    }

    /// Canonical name, as written in the result table
    pub fn name(&self) -> &'static str {
        match self {
            Nutrient::Energy => "energy",
            Nutrient::Protein => "protein",
            Nutrient::Carbohydrate => "carbohydrate",
            Nutrient::Sugar => "sugar",
            Nutrient::Salt => "salt",
            Nutrient::Fat => "fat",
            Nutrient::SaturatedFat => "saturated_fat",
            Nutrient::Fiber => "fiber",
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Nutrient {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Nutrient::all()
            .iter()
            .copied()
            .find(|n| n.name() == normalized)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown nutrient '{}'. Valid nutrients: {}",
                    s,
                    Nutrient::all()
                        .iter()
                        .map(Nutrient::name)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Amount per 100g, `None` when the source did not provide one.
pub type NutrientValue = Option<f64>;

/// Nutrient values of one product from one source.
///
/// Keys outside the nutrient table are ignored; missing keys read as absent.
pub type NutrientValues = BTreeMap<Nutrient, NutrientValue>;

/// Keep only physically meaningful amounts.
///
/// Negative numbers (the legacy `-1` marker included), NaN and infinities
/// all read as absent.
pub fn present(value: NutrientValue) -> NutrientValue {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// Look up a nutrient in a value map, folding missing keys into absence.
pub fn value_of(values: &NutrientValues, nutrient: Nutrient) -> NutrientValue {
    present(values.get(&nutrient).copied().flatten())
}

/// Outcome of comparing one predicted value with its ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOutcome {
    Correct,
    Incorrect,
    /// Prediction or ground truth (or both) missing
    Unavailable,
}

impl ComparisonOutcome {
    pub fn is_determinate(&self) -> bool {
        !matches!(self, ComparisonOutcome::Unavailable)
    }
}

impl std::fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonOutcome::Correct => write!(f, "correct"),
            ComparisonOutcome::Incorrect => write!(f, "incorrect"),
            ComparisonOutcome::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Per-nutrient outcomes of one product.
///
/// Built once by the record comparator and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOutcomeRecord {
    code: String,
    outcomes: BTreeMap<Nutrient, ComparisonOutcome>,
}

impl ProductOutcomeRecord {
    pub fn from_outcomes(
        code: impl Into<String>,
        outcomes: impl IntoIterator<Item = (Nutrient, ComparisonOutcome)>,
    ) -> Self {
        Self {
            code: code.into(),
            outcomes: outcomes.into_iter().collect(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<ComparisonOutcome> {
        self.outcomes.get(&nutrient).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, ComparisonOutcome)> + '_ {
        self.outcomes.iter().map(|(n, o)| (*n, *o))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn count(&self, outcome: ComparisonOutcome) -> usize {
        self.outcomes.values().filter(|o| **o == outcome).count()
    }

    /// Entries that are not `Unavailable`
    pub fn determinate_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_determinate()).count()
    }
}

/// One row of the persisted result table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub code: String,
    pub nutrient: Nutrient,
    pub ground_truth: NutrientValue,
    pub predicted: NutrientValue,
}

impl ResultRow {
    /// Rows for one product, in nutrient order.
    pub fn for_product<'a>(
        code: &str,
        nutrients: impl IntoIterator<Item = &'a Nutrient>,
        ground_truth: &NutrientValues,
        predicted: &NutrientValues,
    ) -> Vec<ResultRow> {
        nutrients
            .into_iter()
            .map(|&nutrient| ResultRow {
                code: code.to_string(),
                nutrient,
                ground_truth: value_of(ground_truth, nutrient),
                predicted: value_of(predicted, nutrient),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrient_order_is_reporting_order() {
        let names: Vec<_> = Nutrient::all().iter().map(Nutrient::name).collect();
        assert_eq!(
            names,
            [
                "energy",
                "protein",
                "carbohydrate",
                "sugar",
                "salt",
                "fat",
                "saturated_fat",
                "fiber"
            ]
        );
        assert!(Nutrient::Energy < Nutrient::Fiber);
        assert_eq!(Nutrient::all().len(), Nutrient::COUNT);
    }

    #[test]
    fn test_nutrient_from_str() {
        assert_eq!("fat".parse::<Nutrient>().unwrap(), Nutrient::Fat);
        assert_eq!(
            "Saturated-Fat".parse::<Nutrient>().unwrap(),
            Nutrient::SaturatedFat
        );
        assert!("vitamin_c".parse::<Nutrient>().is_err());
    }

    #[test]
    fn test_present_rejects_sentinel() {
        assert_eq!(present(Some(-1.0)), None);
        assert_eq!(present(Some(f64::NAN)), None);
        assert_eq!(present(Some(0.0)), Some(0.0));
        assert_eq!(present(None), None);
    }

    #[test]
    fn test_value_of_missing_key_is_absent() {
        let mut values = NutrientValues::new();
        values.insert(Nutrient::Fat, Some(3.5));
        assert_eq!(value_of(&values, Nutrient::Fat), Some(3.5));
        assert_eq!(value_of(&values, Nutrient::Sugar), None);
    }

    #[test]
    fn test_record_counts() {
        let record = ProductOutcomeRecord::from_outcomes(
            "123",
            [
                (Nutrient::Energy, ComparisonOutcome::Correct),
                (Nutrient::Protein, ComparisonOutcome::Incorrect),
                (Nutrient::Sugar, ComparisonOutcome::Unavailable),
            ],
        );
        assert_eq!(record.len(), 3);
        assert_eq!(record.determinate_count(), 2);
        assert_eq!(record.count(ComparisonOutcome::Correct), 1);
        assert_eq!(record.get(Nutrient::Fat), None);
    }

    #[test]
    fn test_record_serializes_in_nutrient_order() {
        let record = ProductOutcomeRecord::from_outcomes(
            "42",
            [
                (Nutrient::Fiber, ComparisonOutcome::Correct),
                (Nutrient::Energy, ComparisonOutcome::Unavailable),
            ],
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"code":"42","outcomes":{"energy":"unavailable","fiber":"correct"}}"#
        );
    }
}
