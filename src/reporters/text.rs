//! Text (terminal) reporter with colors and formatting

use super::{format_metric, EvaluationReport, TOP_MISMATCHES};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Render report as formatted terminal output
pub fn render(report: &EvaluationReport) -> Result<String> {
    let stats = &report.statistics;
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{BOLD}Nutrient Prediction Evaluation{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Source: {}  Products: {}  Rows: {}  Tolerance: {}\n\n",
        report.source, stats.products, stats.rows, stats.tolerance
    ));

    // Detectability / accuracy, one line per nutrient
    out.push_str(&format!("{BOLD}METRICS{RESET}\n"));
    for s in &report.nutrients {
        out.push_str(&format!(
            "  {:<14} detectability: {}  accuracy: {}\n",
            s.nutrient.name(),
            colored_metric(s.detectability),
            colored_metric(s.accuracy)
        ));
    }
    out.push('\n');

    // Outcome tally
    out.push_str(&format!("{BOLD}OUTCOMES{RESET}\n"));
    out.push_str(&format!(
        "{DIM}  NUTRIENT        CORRECT  INCORRECT  NO PRED  NO TRUTH{RESET}\n"
    ));
    for s in &report.nutrients {
        out.push_str(&format!(
            "  {:<14} {:>8} {:>10} {:>8} {:>9}\n",
            s.nutrient.name(),
            s.counts.correct,
            s.counts.incorrect,
            s.counts.prediction_missing,
            s.counts.ground_truth_missing
        ));
    }
    out.push('\n');

    // Completeness histogram
    out.push_str(&format!("{BOLD}COMPLETENESS{RESET} (nutrients judged per product)\n"));
    out.push_str(&format!("{DIM}  STATE  ALL CORRECT  SOME INCORRECT{RESET}\n"));
    for (state, correct, incorrect) in stats.completeness.rows() {
        out.push_str(&format!(
            "  {:>5} {:>12} {:>15}\n",
            state, correct, incorrect
        ));
    }
    out.push('\n');

    // Product scores
    let scores = &stats.scores;
    out.push_str(&format!("{BOLD}SCORES{RESET}\n"));
    out.push_str(&format!(
        "  All correct: {}/{} ({:.0}%)  Mean fraction correct: {:.2}\n\n",
        scores.all_correct,
        scores.products,
        scores.all_correct_rate * 100.0,
        scores.mean_fraction_correct
    ));

    // Most frequent mismatches per nutrient
    let mismatches: Vec<String> = stats
        .confusion
        .iter()
        .filter(|(_, m)| m.mismatches() > 0)
        .map(|(nutrient, m)| {
            let cells = m
                .top_mismatches(TOP_MISMATCHES)
                .iter()
                .map(|(t, p, n)| format!("{}g→{}g ×{}", t, p, n))
                .collect::<Vec<_>>()
                .join(", ");
            format!("  {:<14} {}\n", nutrient.name(), cells)
        })
        .collect();
    if !mismatches.is_empty() {
        out.push_str(&format!("{BOLD}TOP MISMATCHES{RESET} (truth→predicted)\n"));
        for line in mismatches {
            out.push_str(&line);
        }
        out.push('\n');
    }

    if stats.products == 0 {
        out.push_str(&format!(
            "{DIM}No products evaluated yet. Run `nutrient-eval run` first.{RESET}\n"
        ));
    }

    Ok(out)
}

fn colored_metric(value: Option<f64>) -> String {
    let color = match value {
        Some(v) if v >= 0.8 => GREEN,
        Some(v) if v >= 0.5 => YELLOW,
        Some(_) => RED,
        None => DIM,
    };
    format!("{color}{}{RESET}", format_metric(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_text_metrics_lines() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("Nutrient Prediction Evaluation"));
        assert!(out.contains("Products: 2"));
        assert!(out.contains("fat            detectability: "));
        assert!(out.contains("fiber          detectability: \x1b[2mundefined"));
    }

    #[test]
    fn test_text_tally_and_scores() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("  energy                1          0        1         0\n"));
        assert!(out.contains("All correct: 1/2 (50%)"));
        assert!(out.contains("Mean fraction correct: 0.75"));
    }

    #[test]
    fn test_text_mismatches() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("TOP MISMATCHES"));
        assert!(out.contains("sugar          10g→20g ×1"));
    }
}
