//! Inline SVG charts for the HTML report
//!
//! - stacked outcome bars, one per nutrient
//! - stacked completeness histogram, one column per state
//! - one mismatch heat-map per nutrient (hot colormap, darkest = most errors)

use crate::stats::{CompletenessHistogram, ConfusionMatrix, NutrientSummary, CONFUSION_SIZE};

const CORRECT: &str = "#10b981";
const INCORRECT: &str = "#dc2626";
const PREDICTION_MISSING: &str = "#f59e0b";
const GROUND_TRUTH_MISSING: &str = "#94a3b8";

const LABEL_WIDTH: usize = 120;
const BAR_WIDTH: usize = 480;
const BAR_HEIGHT: usize = 22;
const BAR_GAP: usize = 8;

/// Horizontal stacked bars: correct, incorrect, no prediction, no ground truth
pub fn outcome_bars(summaries: &[NutrientSummary]) -> String {
    let max_total = summaries
        .iter()
        .map(|s| s.counts.total())
        .max()
        .unwrap_or(0)
        .max(1);
    let height = summaries.len() * (BAR_HEIGHT + BAR_GAP) + BAR_GAP;
    let width = LABEL_WIDTH + BAR_WIDTH + 60;

    let mut svg = svg_open(width, height, "Outcomes per nutrient");
    for (i, s) in summaries.iter().enumerate() {
        let y = BAR_GAP + i * (BAR_HEIGHT + BAR_GAP);
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" class="chart-label">{}</text>"#,
            LABEL_WIDTH - 8,
            y + BAR_HEIGHT / 2 + 4,
            s.nutrient
        ));

        let mut x = LABEL_WIDTH as f64;
        for (count, color, label) in [
            (s.counts.correct, CORRECT, "correct"),
            (s.counts.incorrect, INCORRECT, "incorrect"),
            (s.counts.prediction_missing, PREDICTION_MISSING, "no prediction"),
            (s.counts.ground_truth_missing, GROUND_TRUTH_MISSING, "no ground truth"),
        ] {
            if count == 0 {
                continue;
            }
            let w = count as f64 / max_total as f64 * BAR_WIDTH as f64;
            svg.push_str(&format!(
                r#"<rect x="{:.1}" y="{}" width="{:.1}" height="{}" fill="{}"><title>{}: {} {}</title></rect>"#,
                x, y, w, BAR_HEIGHT, color, s.nutrient, count, label
            ));
            x += w;
        }
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{}" class="chart-value">{}</text>"#,
            x + 6.0,
            y + BAR_HEIGHT / 2 + 4,
            s.counts.total()
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Legend shared by the outcome chart
pub fn outcome_legend() -> String {
    [
        (CORRECT, "correct"),
        (INCORRECT, "incorrect"),
        (PREDICTION_MISSING, "no prediction"),
        (GROUND_TRUTH_MISSING, "no ground truth"),
    ]
    .iter()
    .map(|(color, label)| {
        format!(
            r#"<span class="legend-item"><span class="legend-swatch" style="background: {}"></span>{}</span>"#,
            color, label
        )
    })
    .collect::<Vec<_>>()
    .join("")
}

/// Vertical stacked columns: products per state, split by veracity
pub fn completeness_histogram(histogram: &CompletenessHistogram) -> String {
    const COLUMN_WIDTH: usize = 48;
    const COLUMN_GAP: usize = 16;
    const PLOT_HEIGHT: usize = 220;
    const AXIS: usize = 24;

    let mut states: Vec<_> = histogram.rows().collect();
    states.reverse();
    let max_total = states.iter().map(|(_, c, i)| c + i).max().unwrap_or(0).max(1);
    let width = states.len() * (COLUMN_WIDTH + COLUMN_GAP) + COLUMN_GAP;
    let height = PLOT_HEIGHT + AXIS * 2;

    let mut svg = svg_open(width, height, "Completeness vs veracity");
    for (idx, (state, correct, incorrect)) in states.into_iter().enumerate() {
        let x = COLUMN_GAP + idx * (COLUMN_WIDTH + COLUMN_GAP);
        let mut top = (AXIS + PLOT_HEIGHT) as f64;
        for (count, color, label) in [
            (correct, CORRECT, "all correct"),
            (incorrect, INCORRECT, "some incorrect"),
        ] {
            if count == 0 {
                continue;
            }
            let h = count as f64 / max_total as f64 * PLOT_HEIGHT as f64;
            top -= h;
            svg.push_str(&format!(
                r#"<rect x="{}" y="{:.1}" width="{}" height="{:.1}" fill="{}"><title>{} nutrients judged: {} {}</title></rect>"#,
                x, top, COLUMN_WIDTH, h, color, state, count, label
            ));
        }
        if correct + incorrect > 0 {
            svg.push_str(&format!(
                r#"<text x="{}" y="{:.1}" text-anchor="middle" class="chart-value">{}</text>"#,
                x + COLUMN_WIDTH / 2,
                top - 4.0,
                correct + incorrect
            ));
        }
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" class="chart-label">{}</text>"#,
            x + COLUMN_WIDTH / 2,
            AXIS + PLOT_HEIGHT + 16,
            state
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// 21x21 grid, ground truth on rows (top = 0 g), prediction on columns
pub fn heatmap(title: &str, matrix: &ConfusionMatrix) -> String {
    const CELL: usize = 12;
    const MARGIN: usize = 28;

    let min = matrix.min();
    let side = CONFUSION_SIZE * CELL;
    let mut svg = svg_open(side + MARGIN, side + MARGIN, title);

    for (truth, row) in matrix.cells().iter().enumerate() {
        for (predicted, value) in row.iter().enumerate() {
            let (r, g, b) = hot(intensity(*value, min));
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="rgb({},{},{})"><title>truth {} g, predicted {} g: {}</title></rect>"#,
                MARGIN + predicted * CELL,
                truth * CELL,
                CELL,
                CELL,
                r,
                g,
                b,
                truth,
                predicted,
                value
            ));
        }
    }
    for tick in (0..CONFUSION_SIZE).step_by(5) {
        let center = tick * CELL + CELL / 2;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" class="chart-tick">{}</text><text x="{}" y="{}" text-anchor="middle" class="chart-tick">{}</text>"#,
            MARGIN - 4,
            center + 3,
            tick,
            MARGIN + center,
            side + 14,
            tick
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn svg_open(width: usize, height: usize, title: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img" aria-label="{t}">"#,
        w = width,
        h = height,
        t = title
    )
}

/// Position of `value` between the most negative cell (0.0) and zero (1.0)
fn intensity(value: i64, min: i64) -> f64 {
    if min >= 0 {
        return 1.0;
    }
    ((value - min) as f64 / (-min) as f64).clamp(0.0, 1.0)
}

/// Black → red → yellow → white
fn hot(t: f64) -> (u8, u8, u8) {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    (
        channel(t / 0.375),
        channel((t - 0.375) / 0.375),
        channel((t - 0.75) / 0.25),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_hot_colormap_ends() {
        assert_eq!(hot(0.0), (0, 0, 0));
        assert_eq!(hot(1.0), (255, 255, 255));
        assert_eq!(hot(0.375), (255, 0, 0));
    }

    #[test]
    fn test_intensity() {
        assert_eq!(intensity(0, 0), 1.0);
        assert_eq!(intensity(-4, -4), 0.0);
        assert_eq!(intensity(-2, -4), 0.5);
    }

    #[test]
    fn test_outcome_bars_one_label_per_nutrient() {
        let report = test_report();
        let svg = outcome_bars(&report.nutrients);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"chart-label\"").count(), 8);
        assert!(svg.contains("fat: 1 incorrect"));
    }

    #[test]
    fn test_histogram_has_nine_columns() {
        let report = test_report();
        let svg = completeness_histogram(&report.statistics.completeness);
        assert_eq!(svg.matches("class=\"chart-label\"").count(), 9);
        assert!(svg.contains("4 nutrients judged: 1 some incorrect"));
    }

    #[test]
    fn test_heatmap_darkest_cell_is_mismatch() {
        let report = test_report();
        let fat = &report.statistics.confusion[&crate::models::Nutrient::Fat];
        let svg = heatmap("fat", fat);
        assert_eq!(svg.matches("<rect").count(), CONFUSION_SIZE * CONFUSION_SIZE);
        assert!(svg.contains(r#"fill="rgb(0,0,0)"><title>truth 3 g, predicted 5 g: -1</title>"#));
        assert!(svg.contains(r#"fill="rgb(255,255,255)"><title>truth 0 g, predicted 0 g: 0</title>"#));
    }
}
