//! Nutrient value sources
//!
//! Two sources feed every comparison:
//! - the prediction service (product metadata → OCR document → nutrient
//!   prediction), behind the [`PredictionSource`] trait
//! - user-entered ground truth, one `<code>.nutriments.json` per product
//!
//! Both return values already normalized to the comparison units.

mod ground_truth;
mod prediction;

pub use ground_truth::{parse_ground_truth, GroundTruthStore, GROUND_TRUTH_SUFFIX};
pub use prediction::{parse_image_id, parse_prediction, split_barcode, HttpPredictionClient};

use crate::config::NutrientTable;
use crate::models::NutrientValues;
use thiserror::Error;

/// Per-product retrieval errors. None of these stop a batch.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Prediction service could not download the OCR document for {code}")]
    ServiceUnavailable { code: String },

    #[error("Malformed response for {code}: {reason}")]
    MalformedResponse { code: String, reason: String },

    #[error("Missing field '{field}' for {code}")]
    MissingField { code: String, field: String },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Short label used in skip statistics
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::ServiceUnavailable { .. } => "service_unavailable",
            SourceError::MalformedResponse { .. } => "malformed_response",
            SourceError::MissingField { .. } => "missing_field",
            SourceError::Http { .. } => "http",
            SourceError::Io(_) => "io",
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Anything that can produce nutrient predictions for a product code
pub trait PredictionSource {
    /// Name of this source (for logging)
    fn name(&self) -> &str;

    /// Predicted values for the nutrients of `table`, normalized
    fn fetch(&self, code: &str, table: &NutrientTable) -> SourceResult<NutrientValues>;
}

/// Read a JSON number or numeric string
pub(crate) fn numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}
