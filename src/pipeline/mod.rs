//! Batch evaluation pipeline
//!
//! For every product code of the ground-truth store:
//! 1. Load and normalize the ground truth
//! 2. Fetch and normalize the prediction
//! 3. Compare the two (logged at debug level)
//! 4. Append the product's rows to the result table
//!
//! Retrieval failures skip the product; only result-table I/O and
//! configuration errors stop the batch.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::NutrientTable;
use crate::models::{NutrientValues, ProductOutcomeRecord, ResultRow};
use crate::results::ResultWriter;
use crate::scoring::{compare_record, score_record, ScoreSummary, ScoringError, Tolerance};
use crate::sources::{GroundTruthStore, PredictionSource, SourceError};

/// Why a single product could not be evaluated
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// One product run through both sources and the comparators
#[derive(Debug, Clone, Serialize)]
pub struct ProductEvaluation {
    pub code: String,
    pub ground_truth: NutrientValues,
    pub predicted: NutrientValues,
    pub record: ProductOutcomeRecord,
    pub scores: ScoreSummary,
}

impl ProductEvaluation {
    /// Result-table rows, one per nutrient of `table`
    pub fn rows(&self, table: &NutrientTable) -> Vec<ResultRow> {
        ResultRow::for_product(
            &self.code,
            &table.nutrients().collect::<Vec<_>>(),
            &self.ground_truth,
            &self.predicted,
        )
    }
}

/// Load the ground truth, fetch the prediction and compare them.
///
/// Ground truth is read first; no request is made for a product whose
/// ground-truth file is unreadable.
pub fn evaluate_product(
    source: &dyn PredictionSource,
    store: &GroundTruthStore,
    code: &str,
    table: &NutrientTable,
    tolerance: Tolerance,
) -> Result<ProductEvaluation, EvaluationError> {
    let ground_truth = store.load(code, table)?;
    let predicted = source.fetch(code, table)?;

    let record = compare_record(code, table, &predicted, &ground_truth, tolerance)?;
    let scores = score_record(&record)?;
    debug!(
        "{}: all_correct={} fraction_correct={:.2}",
        code, scores.all_correct, scores.fraction_correct
    );

    Ok(ProductEvaluation {
        code: code.to_string(),
        ground_truth,
        predicted,
        record,
        scores,
    })
}

/// Batch evaluation pipeline.
pub struct BatchPipeline<'a> {
    source: &'a dyn PredictionSource,
    ground_truth: &'a GroundTruthStore,
    table: NutrientTable,
    tolerance: Tolerance,
    /// Codes already present in the result table
    completed: HashSet<String>,
    /// Stop after this many newly processed products
    limit: Option<usize>,
    show_progress: bool,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(source: &'a dyn PredictionSource, ground_truth: &'a GroundTruthStore) -> Self {
        Self {
            source,
            ground_truth,
            table: NutrientTable::default(),
            tolerance: Tolerance::default(),
            completed: HashSet::new(),
            limit: None,
            show_progress: false,
        }
    }

    pub fn with_table(mut self, table: NutrientTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Skip codes that an earlier, interrupted run already wrote.
    pub fn resume_from(mut self, completed: HashSet<String>) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the batch, writing each evaluated product to `writer`.
    pub fn run<W: Write>(&self, writer: &mut ResultWriter<W>) -> Result<BatchRunStats> {
        if self.table.is_empty() {
            return Err(ScoringError::Configuration("nutrient table is empty".to_string()).into());
        }

        let mut stats = BatchRunStats {
            resumed: self
                .ground_truth
                .codes()
                .filter(|code| self.completed.contains(*code))
                .count(),
            ..Default::default()
        };
        let pending: Vec<&str> = self
            .ground_truth
            .codes()
            .filter(|code| !self.completed.contains(*code))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        if stats.resumed > 0 {
            info!("Resuming: {} products already evaluated", stats.resumed);
        }
        debug!(
            "Evaluating {} products with source '{}'",
            pending.len(),
            self.source.name()
        );

        let bar = self.progress_bar(pending.len());
        for code in pending {
            bar.set_message(code.to_string());
            match evaluate_product(
                self.source,
                self.ground_truth,
                code,
                &self.table,
                self.tolerance,
            ) {
                Ok(evaluation) => {
                    let rows = evaluation.rows(&self.table);
                    writer.write_product(&rows)?;
                    stats.evaluated += 1;
                    stats.rows += rows.len();
                }
                Err(EvaluationError::Source(e)) => {
                    match &e {
                        SourceError::ServiceUnavailable { .. } => debug!("Skipping {}: {}", code, e),
                        _ => warn!("Skipping {}: {}", code, e),
                    }
                    *stats.skipped.entry(e.kind()).or_default() += 1;
                }
                Err(EvaluationError::Scoring(e)) => return Err(e.into()),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        info!("{}", stats.summary());
        Ok(stats)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar
    }
}

/// Statistics from one batch run.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BatchRunStats {
    /// Products compared and written
    pub evaluated: usize,
    /// Rows written
    pub rows: usize,
    /// Products skipped because an earlier run wrote them
    pub resumed: usize,
    /// Products skipped per retrieval error kind
    pub skipped: BTreeMap<&'static str, usize>,
}

impl BatchRunStats {
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} products evaluated", self.evaluated),
            format!("{} rows written", self.rows),
        ];
        if self.resumed > 0 {
            parts.push(format!("{} resumed", self.resumed));
        }
        if !self.skipped.is_empty() {
            let detail = self
                .skipped
                .iter()
                .map(|(kind, n)| format!("{} {}", n, kind))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("{} skipped ({})", self.total_skipped(), detail));
        }
        parts.join(", ")
    }
}
