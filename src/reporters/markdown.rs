//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - README files
//! - Pull request comments
//! - Evaluation logs kept next to the result tables

use super::{format_metric, EvaluationReport, TOP_MISMATCHES};
use anyhow::Result;
use chrono::Local;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &EvaluationReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');

    md.push_str(&render_summary(report));
    md.push('\n');

    md.push_str(&render_metrics(report));
    md.push('\n');

    md.push_str(&render_completeness(report));
    md.push('\n');

    md.push_str(&render_mismatches(report));
    md.push('\n');

    md.push_str(&render_footer());

    Ok(md)
}

fn render_header(report: &EvaluationReport) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    format!(
        r#"# Nutrient Prediction Evaluation

**Source:** `{}` | **Tolerance:** {}

Generated: {}
"#,
        report.source, report.statistics.tolerance, timestamp
    )
}

fn render_summary(report: &EvaluationReport) -> String {
    let stats = &report.statistics;
    format!(
        r#"## Summary

| Metric | Value |
|--------|-------|
| Products | {} |
| Rows | {} |
| All correct | {} ({:.0}%) |
| Mean fraction correct | {:.2} |
"#,
        stats.products,
        stats.rows,
        stats.scores.all_correct,
        stats.scores.all_correct_rate * 100.0,
        stats.scores.mean_fraction_correct
    )
}

fn render_metrics(report: &EvaluationReport) -> String {
    let mut md = String::from(
        "## Per-Nutrient Metrics\n\n\
         | Nutrient | Correct | Incorrect | No prediction | No ground truth | Detectability | Accuracy |\n\
         |----------|--------:|----------:|--------------:|----------------:|--------------:|---------:|\n",
    );
    for s in &report.nutrients {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            s.nutrient,
            s.counts.correct,
            s.counts.incorrect,
            s.counts.prediction_missing,
            s.counts.ground_truth_missing,
            format_metric(s.detectability),
            format_metric(s.accuracy)
        ));
    }
    md
}

fn render_completeness(report: &EvaluationReport) -> String {
    let mut md = String::from(
        "## Completeness vs Veracity\n\n\
         | Nutrients judged | All correct | Some incorrect |\n\
         |-----------------:|------------:|---------------:|\n",
    );
    for (state, correct, incorrect) in report.statistics.completeness.rows() {
        md.push_str(&format!("| {} | {} | {} |\n", state, correct, incorrect));
    }
    md
}

fn render_mismatches(report: &EvaluationReport) -> String {
    let mut md = String::from("## Most Frequent Mismatches\n\n");
    let mut any = false;
    for (nutrient, matrix) in &report.statistics.confusion {
        let top = matrix.top_mismatches(TOP_MISMATCHES);
        if top.is_empty() {
            continue;
        }
        any = true;
        let cells = top
            .iter()
            .map(|(t, p, n)| format!("{} g → {} g (×{})", t, p, n))
            .collect::<Vec<_>>()
            .join(", ");
        md.push_str(&format!("- **{}**: {}\n", nutrient, cells));
    }
    if !any {
        md.push_str("No mismatches in the 0-20 g range.\n");
    }
    md
}

fn render_footer() -> String {
    "---\n\n*Generated by nutrient-eval*\n".to_string()
}
