//! Prediction scoring
//!
//! Compares predicted nutrient amounts with user-entered ground truth and
//! reduces the per-nutrient outcomes into product scores.
//!
//! # Matching Rule
//!
//! ```text
//! either value absent      → Unavailable
//! energy (kcal)            → Correct iff |predicted - truth| <= 1
//! every other nutrient (g) → Correct iff truth×(1-tol) <= predicted <= truth×(1+tol)
//! ```
//!
//! The default tolerance is 10%.
//!
//! # Product Scores
//!
//! - **all_correct** (0 or 1): no nutrient is `Incorrect`. Missing values do
//!   not disqualify a product.
//! - **fraction_correct** (0.0-1.0): `Correct` / determinate entries, rounded
//!   to 2 decimals. Missing values leave the denominator.
//!
//! The two policies treat missing data differently and are kept separate.

mod aggregate;
mod compare;

pub use aggregate::{
    round2, score_all_correct, score_fraction_correct, score_record, BatchScores, ScoreSummary,
};
pub use compare::{
    compare_one, compare_record, Tolerance, DEFAULT_TOLERANCE, ENERGY_ABSOLUTE_TOLERANCE,
};

use crate::models::Nutrient;
use thiserror::Error;

/// Errors raised by the scoring core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot compute {0} on an empty outcome record")]
    EmptyInput(&'static str),

    #[error("{metric} is not computable for {nutrient}: no cases in the denominator")]
    NotComputable {
        metric: &'static str,
        nutrient: Nutrient,
    },
}

pub type ScoringResult<T> = Result<T, ScoringError>;
