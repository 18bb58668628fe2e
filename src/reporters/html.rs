//! HTML reporter with embedded styles and charts
//!
//! Generates a standalone HTML report that can be viewed in any browser.
//! Includes:
//! - Batch totals and product scores
//! - Per-nutrient metrics table with a stacked outcome chart
//! - Completeness vs veracity histogram
//! - One mismatch heat-map per nutrient (energy excluded)

use super::{charts, format_metric, EvaluationReport};
use anyhow::Result;
use chrono::Local;

/// Render report as standalone HTML
pub fn render(report: &EvaluationReport) -> Result<String> {
    let mut html = String::new();

    // DOCTYPE and head
    html.push_str(&render_head(report));

    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&render_header(report));
    html.push_str("<div class=\"content\">\n");

    html.push_str(&render_totals(report));
    html.push_str(&render_metrics(report));
    html.push_str(&render_completeness(report));
    html.push_str(&render_heatmaps(report));

    html.push_str("</div>\n"); // content

    html.push_str(&render_footer());

    html.push_str("</div>\n</body>\n</html>");

    Ok(html)
}

fn render_head(report: &EvaluationReport) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Nutrient Evaluation - {}</title>
    <style>
{CSS}
    </style>
</head>
"#,
        html_escape(&report.source)
    )
}

fn render_header(report: &EvaluationReport) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"<div class="header">
    <h1>Nutrient Prediction Evaluation</h1>
    <p class="timestamp">{} · tolerance {} · generated {}</p>
</div>
"#,
        html_escape(&report.source),
        report.statistics.tolerance,
        timestamp
    )
}

fn render_totals(report: &EvaluationReport) -> String {
    let stats = &report.statistics;
    format!(
        r#"<div class="section">
    <h2 class="section-title">Batch</h2>
    <div class="stats-grid">
        <div class="stat-item">
            <div class="stat-value">{}</div>
            <div class="stat-label">Products</div>
        </div>
        <div class="stat-item">
            <div class="stat-value">{}</div>
            <div class="stat-label">Rows</div>
        </div>
        <div class="stat-item">
            <div class="stat-value">{} ({:.0}%)</div>
            <div class="stat-label">All correct</div>
        </div>
        <div class="stat-item">
            <div class="stat-value">{:.2}</div>
            <div class="stat-label">Mean fraction correct</div>
        </div>
    </div>
</div>
"#,
        stats.products,
        stats.rows,
        stats.scores.all_correct,
        stats.scores.all_correct_rate * 100.0,
        stats.scores.mean_fraction_correct
    )
}

fn render_metrics(report: &EvaluationReport) -> String {
    let rows: String = report
        .nutrients
        .iter()
        .map(|s| {
            format!(
                r#"            <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="{}">{}</td><td class="{}">{}</td></tr>
"#,
                s.nutrient,
                s.counts.correct,
                s.counts.incorrect,
                s.counts.prediction_missing,
                s.counts.ground_truth_missing,
                metric_class(s.detectability),
                format_metric(s.detectability),
                metric_class(s.accuracy),
                format_metric(s.accuracy)
            )
        })
        .collect();

    format!(
        r#"<div class="section">
    <h2 class="section-title">Per-Nutrient Outcomes</h2>
    <div class="chart">{}</div>
    <div class="legend">{}</div>
    <table class="metrics-table">
        <thead>
            <tr><th>Nutrient</th><th>Correct</th><th>Incorrect</th><th>No prediction</th><th>No ground truth</th><th>Detectability</th><th>Accuracy</th></tr>
        </thead>
        <tbody>
{}        </tbody>
    </table>
</div>
"#,
        charts::outcome_bars(&report.nutrients),
        charts::outcome_legend(),
        rows
    )
}

fn render_completeness(report: &EvaluationReport) -> String {
    format!(
        r#"<div class="section">
    <h2 class="section-title">Completeness vs Veracity</h2>
    <p class="section-note">Products by number of nutrients with both values present. Green: every judged nutrient correct.</p>
    <div class="chart">{}</div>
</div>
"#,
        charts::completeness_histogram(&report.statistics.completeness)
    )
}

fn render_heatmaps(report: &EvaluationReport) -> String {
    let maps: String = report
        .statistics
        .confusion
        .iter()
        .map(|(nutrient, matrix)| {
            format!(
                r#"        <div class="heatmap-card">
            <h3>{} <span class="heatmap-count">{} mismatches</span></h3>
            {}
        </div>
"#,
                nutrient,
                matrix.mismatches(),
                charts::heatmap(nutrient.name(), matrix)
            )
        })
        .collect();

    format!(
        r#"<div class="section">
    <h2 class="section-title">Mismatch Heat-Maps</h2>
    <p class="section-note">Rows: ground truth (g), columns: prediction (g, clamped at 20). Darker cells hold more mismatches.</p>
    <div class="heatmap-grid">
{}    </div>
</div>
"#,
        maps
    )
}

fn render_footer() -> String {
    r#"<div class="footer">
    <p>Generated by nutrient-eval</p>
</div>
"#
    .to_string()
}

fn metric_class(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v >= 0.8 => "metric-good",
        Some(v) if v >= 0.5 => "metric-moderate",
        Some(_) => "metric-poor",
        None => "metric-undefined",
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Embedded CSS
const CSS: &str = r#"
:root {
    --primary-color: #16a34a;
    --background-color: #f8fafc;
    --text-color: #1e293b;
    --card-background: white;
    --border-color: #e2e8f0;
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    color: var(--text-color);
    background: var(--background-color);
    padding: 2rem;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    background: var(--card-background);
    border-radius: 12px;
    box-shadow: 0 4px 6px -1px rgba(0,0,0,0.1);
    overflow: hidden;
}

.header {
    background: linear-gradient(135deg, #16a34a 0%, #0d9488 100%);
    color: white;
    padding: 3rem 2rem;
    text-align: center;
}

.header h1 { font-size: 2.5rem; margin-bottom: 0.5rem; }
.header .timestamp { opacity: 0.9; font-size: 0.95rem; }

.content { padding: 2rem; }

.section { margin-bottom: 2rem; }
.section-title {
    font-size: 1.5rem;
    margin-bottom: 1rem;
    padding-bottom: 0.5rem;
    border-bottom: 2px solid var(--border-color);
}
.section-note { color: #64748b; font-size: 0.875rem; margin-bottom: 1rem; }

.stats-grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
    gap: 1rem;
}

.stat-item {
    background: var(--card-background);
    border: 1px solid var(--border-color);
    border-radius: 8px;
    padding: 1.5rem;
    text-align: center;
}

.stat-value { font-size: 2rem; font-weight: bold; margin-bottom: 0.5rem; }
.stat-label { font-size: 0.875rem; color: #64748b; }

.chart { overflow-x: auto; margin-bottom: 0.5rem; }
.chart-label { font-size: 12px; fill: #1e293b; }
.chart-value { font-size: 11px; fill: #64748b; }
.chart-tick { font-size: 9px; fill: #64748b; }

.legend { display: flex; gap: 1rem; flex-wrap: wrap; margin-bottom: 1rem; font-size: 0.875rem; }
.legend-item { display: flex; align-items: center; gap: 0.35rem; }
.legend-swatch { width: 12px; height: 12px; border-radius: 2px; display: inline-block; }

.metrics-table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
.metrics-table th, .metrics-table td {
    padding: 0.5rem 0.75rem;
    border-bottom: 1px solid var(--border-color);
    text-align: right;
}
.metrics-table th:first-child, .metrics-table td:first-child { text-align: left; }
.metrics-table th { color: #64748b; font-weight: 600; }

.metric-good { color: #059669; font-weight: 600; }
.metric-moderate { color: #ca8a04; font-weight: 600; }
.metric-poor { color: #dc2626; font-weight: 600; }
.metric-undefined { color: #94a3b8; font-style: italic; }

.heatmap-grid {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(300px, 1fr));
    gap: 1rem;
}

.heatmap-card {
    border: 1px solid var(--border-color);
    border-radius: 8px;
    padding: 1rem;
}

.heatmap-card h3 { font-size: 1rem; margin-bottom: 0.5rem; }
.heatmap-count { color: #64748b; font-weight: normal; font-size: 0.8rem; }

.footer {
    text-align: center;
    padding: 2rem;
    color: #64748b;
    border-top: 1px solid var(--border-color);
}

@media (max-width: 768px) {
    body { padding: 1rem; }
    .header { padding: 2rem 1rem; }
    .header h1 { font-size: 1.75rem; }
}

@media print {
    body { padding: 0; background: white; }
    .container { box-shadow: none; }
    .heatmap-card { page-break-inside: avoid; }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_html_is_standalone_document() {
        let html = render(&test_report()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("<style>"));
    }

    #[test]
    fn test_html_has_all_charts() {
        let html = render(&test_report()).unwrap();
        // outcome bars + completeness + 7 heat-maps
        assert_eq!(html.matches("<svg").count(), 9);
        assert_eq!(html.matches("class=\"heatmap-card\"").count(), 7);
        assert!(!html.contains("aria-label=\"energy\""));
        assert!(html.contains("aria-label=\"saturated_fat\""));
    }

    #[test]
    fn test_html_undefined_metric() {
        let html = render(&test_report()).unwrap();
        assert!(html.contains(r#"<td class="metric-undefined">undefined</td>"#));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }
}
