//! Run command - batch evaluation over a ground-truth directory

use anyhow::{Context, Result};
use console::{style, Term};
use nutrient_eval::config::EvalConfig;
use nutrient_eval::pipeline::BatchPipeline;
use nutrient_eval::results::{completed_codes, ResultWriter};
use nutrient_eval::sources::{GroundTruthStore, HttpPredictionClient};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

pub fn run(
    config: &EvalConfig,
    data_dir: &Path,
    output: &Path,
    resume: bool,
    limit: Option<usize>,
    tolerance: Option<f64>,
) -> Result<()> {
    let start = Instant::now();
    let table = config.nutrient_table()?;
    let tolerance = config.tolerance(tolerance)?;

    let store = GroundTruthStore::open(data_dir)
        .with_context(|| format!("Cannot read data directory {}", data_dir.display()))?;
    if store.is_empty() {
        anyhow::bail!(
            "No *.nutriments.json files found under {}",
            data_dir.display()
        );
    }

    let (completed, mut writer) = if resume {
        (completed_codes(output)?, ResultWriter::append(output)?)
    } else {
        (HashSet::new(), ResultWriter::create(output)?)
    };

    println!(
        "\n{} Evaluating {} products from {}\n",
        style("▶").bold(),
        style(store.len()).cyan(),
        style(data_dir.display()).cyan()
    );

    let client = HttpPredictionClient::new(config.service.clone());
    let stats = BatchPipeline::new(&client, &store)
        .with_table(table)
        .with_tolerance(tolerance)
        .resume_from(completed)
        .with_limit(limit)
        .with_progress(Term::stderr().is_term())
        .run(&mut writer)?;

    println!("{} {}", style("✓").green(), stats.summary());
    println!(
        "  Results written to {} in {:.1}s",
        style(output.display()).cyan(),
        start.elapsed().as_secs_f64()
    );
    if stats.total_skipped() > 0 {
        println!(
            "  {}",
            style("Skipped products are retried by the next `--resume` run").dim()
        );
    }
    Ok(())
}
