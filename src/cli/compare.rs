//! Compare command - evaluate one product

use anyhow::{Context, Result};
use console::style;
use nutrient_eval::config::{EvalConfig, NutrientTable};
use nutrient_eval::models::{value_of, ComparisonOutcome, NutrientValue};
use nutrient_eval::pipeline::{evaluate_product, ProductEvaluation};
use nutrient_eval::scoring::Tolerance;
use nutrient_eval::sources::{GroundTruthStore, HttpPredictionClient};
use std::path::Path;

pub fn run(
    config: &EvalConfig,
    code: &str,
    data_dir: &Path,
    json: bool,
    tolerance: Option<f64>,
) -> Result<()> {
    let table = config.nutrient_table()?;
    let tolerance = config.tolerance(tolerance)?;
    let store = GroundTruthStore::open(data_dir)
        .with_context(|| format!("Cannot read data directory {}", data_dir.display()))?;
    if !store.contains(code) {
        anyhow::bail!(
            "No ground truth for {} under {}",
            code,
            data_dir.display()
        );
    }

    let client = HttpPredictionClient::new(config.service.clone());
    let evaluation = evaluate_product(&client, &store, code, &table, tolerance)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print!("{}", render(&evaluation, &table, tolerance));
    }
    Ok(())
}

fn render(evaluation: &ProductEvaluation, table: &NutrientTable, tolerance: Tolerance) -> String {
    let mut out = format!(
        "\n{} {}  {}\n\n",
        style("Product").bold(),
        style(&evaluation.code).cyan(),
        style(format!("tolerance {}", tolerance)).dim()
    );
    out.push_str(&format!(
        "  {}\n",
        style(format!(
            "{:<14} {:>12} {:>12}  {}",
            "NUTRIENT", "GROUND TRUTH", "PREDICTED", "OUTCOME"
        ))
        .dim()
    ));

    for nutrient in table.nutrients() {
        let outcome = evaluation
            .record
            .get(nutrient)
            .unwrap_or(ComparisonOutcome::Unavailable);
        let styled = match outcome {
            ComparisonOutcome::Correct => style(outcome.to_string()).green(),
            ComparisonOutcome::Incorrect => style(outcome.to_string()).red(),
            ComparisonOutcome::Unavailable => style(outcome.to_string()).dim(),
        };
        out.push_str(&format!(
            "  {:<14} {:>12} {:>12}  {}\n",
            nutrient.name(),
            format_amount(value_of(&evaluation.ground_truth, nutrient)),
            format_amount(value_of(&evaluation.predicted, nutrient)),
            styled
        ));
    }

    out.push_str(&format!(
        "\n  All correct: {}  Fraction correct: {:.2}\n",
        evaluation.scores.all_correct, evaluation.scores.fraction_correct
    ));
    out
}

fn format_amount(value: NutrientValue) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrient_eval::models::{Nutrient, NutrientValues};
    use nutrient_eval::sources::{PredictionSource, SourceResult};

    struct Fixed;

    impl PredictionSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, _code: &str, _table: &NutrientTable) -> SourceResult<NutrientValues> {
            Ok([(Nutrient::Energy, Some(262.0)), (Nutrient::Fat, Some(9.0))]
                .into_iter()
                .collect())
        }
    }

    #[test]
    fn test_render_lists_every_nutrient() {
        console::set_colors_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("42.nutriments.json"),
            r#"{"energy_value": 1100, "energy_unit": "kJ", "fat_100g": 12}"#,
        )
        .unwrap();
        let store = GroundTruthStore::open(dir.path()).unwrap();
        let table = NutrientTable::default();
        let evaluation =
            evaluate_product(&Fixed, &store, "42", &table, Tolerance::default()).unwrap();

        let out = render(&evaluation, &table, Tolerance::default());
        assert!(out.contains("energy"));
        assert!(out.contains("262          262  correct"));
        assert!(out.contains("incorrect"));
        assert!(out.contains("All correct: 0  Fraction correct: 0.50"));
        assert_eq!(out.matches("unavailable").count(), Nutrient::COUNT - 2);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(None), "-");
        assert_eq!(format_amount(Some(1.5)), "1.5");
    }
}
