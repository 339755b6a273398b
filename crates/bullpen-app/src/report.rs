// Report rendering: plain-text tables or JSON.

use bullpen_baseball::ComparisonTable;
use bullpen_core::config::OutputFormat;
use bullpen_stats::BootstrapEstimate;

use crate::app::Report;

pub fn render(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => render_json(report),
    }
}

pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Ordinal suffix for a percentile, e.g. 80 -> "80th", 22.5 -> "22.5th".
fn ordinal(pct: f64) -> String {
    if pct.fract() != 0.0 {
        return format!("{pct}th");
    }
    let n = pct as u64;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn write_table(out: &mut String, table: &ComparisonTable) {
    out.push_str(&format!("== {} ==\n", table.scope));
    out.push_str(&format!(
        "{:<8} {:>10} {:>14} {:>14} {:>9} {:>9}\n",
        "metric", "p-value", "mean higher", "mean lower", "n higher", "n lower"
    ));
    for row in &table.rows {
        out.push_str(&format!(
            "{:<8} {:>10.4} {:>14.4} {:>14.4} {:>9} {:>9}\n",
            row.metric.label(),
            row.p_value,
            row.mean_higher,
            row.mean_lower,
            row.n_higher,
            row.n_lower
        ));
    }
    for skip in &table.skipped {
        out.push_str(&format!("skipped {}: {}\n", skip.metric, skip.reason));
    }
    out.push('\n');
}

fn interval_cell(estimate: &BootstrapEstimate) -> String {
    format!(
        "{:.4} [{:.4}, {:.4}]",
        estimate.bootstrap_mean, estimate.interval.lower, estimate.interval.upper
    )
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Relief pitcher salary analysis: {}\n",
        report.description
    ));
    out.push_str(&format!(
        "Cohorts split at the {} salary percentile, {} t-test\n\n",
        ordinal(report.percentile),
        report.variant
    ));

    for table in &report.seasons {
        write_table(&mut out, table);
    }
    write_table(&mut out, &report.pooled);

    if !report.bootstrap.is_empty() {
        out.push_str(&format!(
            "== pooled bootstrap: {}% interval of the mean, {} resamples ==\n",
            report.confidence_level * 100.0,
            report.resamples
        ));
        out.push_str(&format!("{:<8} {:>34} {:>34}\n", "metric", "higher", "lower"));
        for b in &report.bootstrap {
            out.push_str(&format!(
                "{:<8} {:>34} {:>34}\n",
                b.metric.label(),
                interval_cell(&b.higher),
                interval_cell(&b.lower)
            ));
        }
        out.push('\n');
    }

    if !report.correlations.is_empty() {
        out.push_str(&format!(
            "== pooled correlation with {} ==\n",
            report.correlations[0].against
        ));
        out.push_str(&format!(
            "{:<8} {:>10} {:>10} {:>10} {:>10}\n",
            "metric", "r higher", "p higher", "r lower", "p lower"
        ));
        for c in &report.correlations {
            out.push_str(&format!(
                "{:<8} {:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
                c.metric.label(),
                c.higher.coefficient,
                c.higher.p_value,
                c.lower.coefficient,
                c.lower.p_value
            ));
        }
        out.push('\n');
    }

    for skip in &report.skipped {
        out.push_str(&format!(
            "skipped pooled {:?} for {}: {}\n",
            skip.kind, skip.metric, skip.reason
        ));
    }
    out
}
