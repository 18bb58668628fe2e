//! Unit normalization
//!
//! Both sides of a comparison must be in the same unit before they reach
//! the comparator. Energy is compared in kcal, everything else in grams.

use serde::{Deserialize, Serialize};

/// Kilojoules per kilocalorie
pub const KJ_PER_KCAL: f64 = 4.184;

/// How a nutrient's raw amount is brought to its comparison unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRule {
    /// kJ is converted to whole kcal (truncated); kcal and unitless pass through
    Energy,
    /// mg and µg are scaled to grams; g and unitless pass through
    Mass,
}

impl UnitRule {
    /// Convert `value` expressed in `unit` to the comparison unit.
    ///
    /// Unknown units pass through unchanged.
    pub fn normalize(self, value: f64, unit: Option<&str>) -> f64 {
        let unit = unit.map(|u| u.trim().to_lowercase());
        match (self, unit.as_deref()) {
            (UnitRule::Energy, Some("kj")) => (value / KJ_PER_KCAL).trunc(),
            (UnitRule::Mass, Some("mg")) => value / 1_000.0,
            (UnitRule::Mass, Some("µg" | "ug" | "mcg")) => value / 1_000_000.0,
            _ => value,
        }
    }
}
