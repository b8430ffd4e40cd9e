use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use common::{AnalysisResult, FailureReason, Result, RunStatistics};
use screener::RankedResults;

const RESULT_HEADER: [&str; 8] = [
    "Stock Symbol",
    "Company Name",
    "Current Price",
    "10 EMA",
    "Distance from EMA (%)",
    "Last Touch Date",
    "Volatility Ratio",
    "Analysis Date",
];

const DEBUG_EXTRA_HEADER: [&str; 9] = [
    "In Uptrend",
    "EMA Touched",
    "Touch Distance (%)",
    "Consolidating",
    "Avg Distance From EMA",
    "EMA Rising",
    "Verdict",
    "Failure Reason",
    "Error",
];

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn result_fields(r: &AnalysisResult, analysis_date: NaiveDate) -> [String; 8] {
    [
        r.symbol.clone(),
        r.company_name.clone(),
        fixed(r.current_price, 2),
        fixed(r.ema_value, 2),
        fixed(r.distance_percent, 2),
        date(r.touch_date),
        fixed(r.volatility_ratio, 4),
        analysis_date.format("%Y-%m-%d").to_string(),
    ]
}

/// Write the ranked candidates. The header is written even when nothing passed.
pub fn write_results<W: Write>(
    writer: W,
    ranked: &RankedResults,
    analysis_date: NaiveDate,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RESULT_HEADER)?;
    for r in ranked.as_slice() {
        wtr.write_record(result_fields(r, analysis_date))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_results_csv(
    path: &Path,
    ranked: &RankedResults,
    analysis_date: NaiveDate,
) -> Result<()> {
    write_results(File::create(path)?, ranked, analysis_date)?;
    info!(path = %path.display(), rows = ranked.len(), "Results written");
    Ok(())
}

/// Write every result, in the order given, with all intermediate metrics.
pub fn write_debug<W: Write>(
    writer: W,
    results: &[AnalysisResult],
    analysis_date: NaiveDate,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RESULT_HEADER.iter().chain(DEBUG_EXTRA_HEADER.iter()))?;
    for r in results {
        let extra = [
            r.in_uptrend.to_string(),
            r.ema_touched.to_string(),
            fixed(r.touch_distance_percent, 2),
            r.is_consolidating.to_string(),
            fixed(r.avg_distance_from_ema, 4),
            r.ema_rising.to_string(),
            r.verdict.to_string(),
            r.failure_reason.map(|f| f.to_string()).unwrap_or_default(),
            r.error.clone().unwrap_or_default(),
        ];
        wtr.write_record(result_fields(r, analysis_date).iter().chain(extra.iter()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_debug_csv(
    path: &Path,
    results: &[AnalysisResult],
    analysis_date: NaiveDate,
) -> Result<()> {
    write_debug(File::create(path)?, results, analysis_date)?;
    info!(path = %path.display(), rows = results.len(), "Debug table written");
    Ok(())
}

/// Human-readable run summary with a preview of the top `preview_rows`.
pub fn format_summary(stats: &RunStatistics, ranked: &RankedResults, preview_rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "EMA pullback screen");
    let _ = writeln!(out, "  Total analyzed: {}", stats.total_analyzed);
    let _ = writeln!(out, "  Passed:         {}", stats.passed);
    let _ = writeln!(out, "  Failed:         {}", stats.failed());
    for reason in FailureReason::ALL {
        let _ = writeln!(out, "    {:<18} {}", reason.to_string(), stats.failure_count(reason));
    }

    if ranked.is_empty() {
        let _ = writeln!(out, "\nNo instruments passed the screen.");
        return out;
    }

    let _ = writeln!(
        out,
        "\nTop {} of {}:",
        preview_rows.min(ranked.len()),
        ranked.len()
    );
    let _ = writeln!(
        out,
        "  {:<16} {:<28} {:>10} {:>10} {:>8}  {:<10}",
        "Symbol", "Company", "Price", "EMA", "Dist %", "Touched"
    );
    for r in ranked.top(preview_rows) {
        let company: String = r.company_name.chars().take(28).collect();
        let _ = writeln!(
            out,
            "  {:<16} {:<28} {:>10} {:>10} {:>8}  {:<10}",
            r.symbol,
            company,
            fixed(r.current_price, 2),
            fixed(r.ema_value, 2),
            fixed(r.distance_percent, 2),
            date(r.touch_date),
        );
    }
    out
}

pub fn print_summary(stats: &RunStatistics, ranked: &RankedResults, preview_rows: usize) {
    println!("{}", format_summary(stats, ranked, preview_rows));
}
