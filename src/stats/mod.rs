//! Batch statistics over a result table
//!
//! Built in one pass over the persisted rows:
//! - per-nutrient outcome tally with detectability and accuracy
//! - completeness vs veracity histogram (one entry per product)
//! - mismatch heat-maps for every nutrient except energy
//! - product scores averaged over the batch

mod completeness;
mod confusion;
mod tally;

pub use completeness::CompletenessHistogram;
pub use confusion::{ConfusionMatrix, MAX_BUCKET, SIZE as CONFUSION_SIZE};
pub use tally::OutcomeCounts;

use crate::config::NutrientTable;
use crate::models::{Nutrient, NutrientValues, ResultRow};
use crate::scoring::{compare_record, BatchScores, ScoringError, ScoringResult, Tolerance};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything the reporters need about one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatistics {
    pub tolerance: Tolerance,
    pub products: usize,
    pub rows: usize,
    pub counts: BTreeMap<Nutrient, OutcomeCounts>,
    pub completeness: CompletenessHistogram,
    pub confusion: BTreeMap<Nutrient, ConfusionMatrix>,
    pub scores: BatchScores,
}

/// Tally and derived metrics of one nutrient.
///
/// Undefined metrics are `None` (`null` in JSON).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientSummary {
    pub nutrient: Nutrient,
    #[serde(flatten)]
    pub counts: OutcomeCounts,
    pub detectability: Option<f64>,
    pub accuracy: Option<f64>,
}

impl BatchStatistics {
    /// Compute statistics from result rows.
    ///
    /// Rows of nutrients outside `table` are ignored. Fails only when the
    /// table is empty.
    pub fn from_rows(
        rows: &[ResultRow],
        table: &NutrientTable,
        tolerance: Tolerance,
    ) -> ScoringResult<Self> {
        if table.is_empty() {
            return Err(ScoringError::Configuration(
                "nutrient table is empty".to_string(),
            ));
        }
        let products = group_by_product(rows, table);

        let mut counts: BTreeMap<Nutrient, OutcomeCounts> =
            table.nutrients().map(|n| (n, OutcomeCounts::default())).collect();
        let mut confusion: BTreeMap<Nutrient, ConfusionMatrix> = table
            .nutrients()
            .filter(|n| *n != Nutrient::Energy)
            .map(|n| (n, ConfusionMatrix::default()))
            .collect();
        let mut completeness = CompletenessHistogram::default();
        let mut records = Vec::with_capacity(products.len());

        for (code, (ground_truth, predicted)) in &products {
            for nutrient in table.nutrients() {
                let gt = ground_truth.get(&nutrient).copied().flatten();
                let pred = predicted.get(&nutrient).copied().flatten();
                if let Some(c) = counts.get_mut(&nutrient) {
                    c.record(nutrient, gt, pred, tolerance);
                }
                if let Some(m) = confusion.get_mut(&nutrient) {
                    m.record(gt, pred);
                }
            }

            let record = compare_record(code, table, predicted, ground_truth, tolerance)?;
            completeness.record(&record);
            records.push(record);
        }

        let scores = BatchScores::from_records(&records)?;
        debug!(
            "Computed statistics for {} products ({} rows)",
            products.len(),
            rows.len()
        );

        Ok(Self {
            tolerance,
            products: products.len(),
            rows: rows.len(),
            counts,
            completeness,
            confusion,
            scores,
        })
    }

    /// Per-nutrient summaries in reporting order
    pub fn summaries(&self) -> Vec<NutrientSummary> {
        self.counts
            .iter()
            .map(|(nutrient, counts)| NutrientSummary {
                nutrient: *nutrient,
                counts: *counts,
                detectability: counts.detectability(*nutrient).ok(),
                accuracy: counts.accuracy(*nutrient).ok(),
            })
            .collect()
    }
}

fn group_by_product(
    rows: &[ResultRow],
    table: &NutrientTable,
) -> BTreeMap<String, (NutrientValues, NutrientValues)> {
    let mut products: BTreeMap<String, (NutrientValues, NutrientValues)> = BTreeMap::new();
    for row in rows.iter().filter(|r| table.contains(r.nutrient)) {
        let (gt, pred) = products.entry(row.code.clone()).or_default();
        gt.insert(row.nutrient, row.ground_truth);
        pred.insert(row.nutrient, row.predicted);
    }
    products
}
