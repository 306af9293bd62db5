//! Plain-text tables and bars for terminal output.

use biasshield_core::aggregate::FOUR_FIFTHS_THRESHOLD;
use biasshield_core::trend::SeriesSummary;
use biasshield_core::types::format_rate;
use biasshield_core::{BiasMetrics, DataSource, IntersectionalRecord, TemporalRecord};
use serde::Serialize;

const BAR_WIDTH: usize = 30;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a notice on stderr when a value was computed locally.
pub fn source_notice(source: DataSource, quiet: bool) {
    if source == DataSource::Fallback && !quiet {
        eprintln!("note: backend unavailable, showing {}", source);
    }
}

pub fn percent(value: f64) -> String {
    format_rate(Some(value))
}

/// Horizontal bar for a value in `[0, 1]`.
pub fn bar(value: f64) -> String {
    let filled = (value.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Group rates for one attribute of a fairness report.
pub fn metrics_table(metrics: &BiasMetrics) -> String {
    let mut out = format!(
        "  {:<12} {:>9} {:>9} {:>9}  {}\n",
        "Group", "Approval", "FPR", "FNR", ""
    );
    for (group, &rate) in &metrics.approval_rates {
        out.push_str(&format!(
            "  {:<12} {:>9} {:>9} {:>9}  {}\n",
            group,
            percent(rate),
            format_rate(metrics.fp_rates.get(group).copied()),
            format_rate(metrics.fn_rates.get(group).copied()),
            bar(rate)
        ));
    }
    out.push_str(&format!(
        "  Disparity    approval {}  |  FPR {}  |  FNR {}\n",
        percent(metrics.approval_disparity),
        percent(metrics.fp_disparity),
        percent(metrics.fn_disparity)
    ));
    out
}

pub fn intersectional_table(records: &[IntersectionalRecord]) -> String {
    let mut out = format!(
        "  {:<28} {:>9} {:>7} {:>7} {:>6}\n",
        "Combination", "Approval", "FPR", "FNR", "DI"
    );
    for r in records {
        let flag = if r.disparate_impact < FOUR_FIFTHS_THRESHOLD {
            "  !"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {:<28} {:>9} {:>7} {:>7} {:>6.2}{}\n",
            r.label(),
            percent(r.approval_rate),
            percent(r.false_positive_rate),
            percent(r.false_negative_rate),
            r.disparate_impact,
            flag
        ));
    }
    out
}

/// Monthly values with their moving average.
pub fn series_table(series: &[TemporalRecord], summary: &SeriesSummary) -> String {
    let mut out = format!("  {:<8} {:>8} {:>8}\n", "Month", "Value", "Avg");
    for (record, avg) in series.iter().zip(&summary.moving_average) {
        let value = summary.metric.get(record);
        out.push_str(&format!(
            "  {:<8} {:>8} {:>8}  {}\n",
            record.date.format("%Y-%m"),
            percent(value),
            format_rate(*avg),
            bar(value)
        ));
    }
    out
}
