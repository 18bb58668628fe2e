//! Output reporters for batch evaluation results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON
//! - `html` - Standalone HTML report with SVG charts
//! - `markdown` - GitHub-flavored Markdown

mod charts;
mod html;
mod json;
mod markdown;
mod text;

use crate::stats::{BatchStatistics, NutrientSummary};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;

/// Heat-map cells listed per nutrient in text and markdown output
const TOP_MISMATCHES: usize = 3;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, html, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// What every reporter renders: statistics of one result table
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Where the rows came from (usually the result table path)
    pub source: String,
    pub statistics: BatchStatistics,
    pub nutrients: Vec<NutrientSummary>,
}

impl EvaluationReport {
    pub fn new(source: impl Into<String>, statistics: BatchStatistics) -> Self {
        let nutrients = statistics.summaries();
        Self {
            source: source.into(),
            statistics,
            nutrients,
        }
    }
}

/// Render a report using an OutputFormat enum
pub fn report_with_format(report: &EvaluationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Html => html::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Html => "html",
        OutputFormat::Markdown => "md",
    }
}

/// Two decimals, or `undefined` when the metric has no denominator
fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "undefined".to_string(),
    }
}
