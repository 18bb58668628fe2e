//! Report command - statistics and charts over a result table

use anyhow::Result;
use console::style;
use nutrient_eval::config::EvalConfig;
use nutrient_eval::reporters::{self, EvaluationReport, OutputFormat};
use nutrient_eval::results::read_rows;
use nutrient_eval::stats::BatchStatistics;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub fn run(
    config: &EvalConfig,
    input: &Path,
    format: &str,
    output: Option<&Path>,
    tolerance: Option<f64>,
) -> Result<()> {
    let format = OutputFormat::from_str(format)?;
    let table = config.nutrient_table()?;
    let tolerance = config.tolerance(tolerance)?;

    let rows = read_rows(input)?;
    debug!("Read {} rows from {}", rows.len(), input.display());

    let stats = BatchStatistics::from_rows(&rows, &table, tolerance)?;
    let report = EvaluationReport::new(input.display().to_string(), stats);
    let rendered = reporters::report_with_format(&report, format)?;

    match output.map(|path| output_path(path, format)) {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            // stderr keeps stdout clean for piping
            eprintln!(
                "Report written to: {}",
                style(path.display()).cyan()
            );
        }
        None => {
            if format == OutputFormat::Json {
                println!("{}", rendered);
            } else {
                print!("{}", rendered);
            }
        }
    }
    Ok(())
}

/// `-o eval` with `--format html` writes `eval.html`
fn output_path(path: &Path, format: OutputFormat) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(reporters::file_extension(format))
    }
}
