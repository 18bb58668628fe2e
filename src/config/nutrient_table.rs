//! Nutrient table: canonical nutrient → source field names and unit rule
//!
//! Ground-truth documents and prediction documents name nutrients
//! differently (`proteins_100g` vs `protein`). The table is the single place
//! that maps between them.

use crate::models::Nutrient;
use crate::normalize::UnitRule;
use serde::Serialize;

/// Field mapping for one nutrient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NutrientSpec {
    pub nutrient: Nutrient,
    /// Key in the `<code>.nutriments.json` ground-truth document
    pub ground_truth_key: String,
    /// Key holding the ground-truth unit, when the document carries one
    pub ground_truth_unit_key: Option<String>,
    /// Key under `nutrients` in the prediction document
    pub prediction_key: String,
    pub unit: UnitRule,
}

impl NutrientSpec {
    fn builtin(nutrient: Nutrient) -> Self {
        let (ground_truth_key, unit) = match nutrient {
            Nutrient::Energy => ("energy_value", UnitRule::Energy),
            Nutrient::Protein => ("proteins_100g", UnitRule::Mass),
            Nutrient::Carbohydrate => ("carbohydrates_100g", UnitRule::Mass),
            Nutrient::Sugar => ("sugars_100g", UnitRule::Mass),
            Nutrient::Salt => ("sodium_100g", UnitRule::Mass),
            Nutrient::Fat => ("fat_100g", UnitRule::Mass),
            Nutrient::SaturatedFat => ("saturated-fat_100g", UnitRule::Mass),
            Nutrient::Fiber => ("fiber_100g", UnitRule::Mass),
        };
        Self {
            nutrient,
            ground_truth_key: ground_truth_key.to_string(),
            ground_truth_unit_key: (nutrient == Nutrient::Energy).then(|| "energy_unit".to_string()),
            prediction_key: nutrient.name().to_string(),
            unit,
        }
    }
}

/// Ordered set of nutrients under evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NutrientTable {
    specs: Vec<NutrientSpec>,
}

impl Default for NutrientTable {
    fn default() -> Self {
        Self {
            specs: Nutrient::all().iter().map(|n| NutrientSpec::builtin(*n)).collect(),
        }
    }
}

impl NutrientTable {
    pub fn empty() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NutrientSpec> {
        self.specs.iter()
    }

    pub fn nutrients(&self) -> impl Iterator<Item = Nutrient> + '_ {
        self.specs.iter().map(|s| s.nutrient)
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<&NutrientSpec> {
        self.specs.iter().find(|s| s.nutrient == nutrient)
    }

    pub fn get_mut(&mut self, nutrient: Nutrient) -> Option<&mut NutrientSpec> {
        self.specs.iter_mut().find(|s| s.nutrient == nutrient)
    }

    pub fn contains(&self, nutrient: Nutrient) -> bool {
        self.get(nutrient).is_some()
    }

    /// Drop a nutrient from the evaluation
    pub fn remove(&mut self, nutrient: Nutrient) {
        self.specs.retain(|s| s.nutrient != nutrient);
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
