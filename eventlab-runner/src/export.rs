//! Reporting and export: JSON manifest, CSV equity series, Markdown report.
//!
//! All persisted manifests carry a `schema_version`. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use eventlab_core::analytics::PerformanceSummary;
use eventlab_core::portfolio::EquityCurve;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per holdings snapshot.
///
/// Columns: `timestamp`, one market value per symbol, `cash`, `commission`,
/// `total`, `returns` (empty where undefined), `equity_curve` (growth of 1).
pub fn export_equity_csv(curve: &EquityCurve) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["timestamp".to_string()];
    header.extend(curve.symbols.iter().cloned());
    header.extend(
        ["cash", "commission", "total", "returns", "equity_curve"]
            .iter()
            .map(|s| s.to_string()),
    );
    wtr.write_record(&header)?;

    for point in &curve.points {
        let h = &point.holdings;
        let mut row = vec![h.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()];
        row.extend(
            curve
                .symbols
                .iter()
                .map(|sym| format!("{:.2}", h.market_value(sym))),
        );
        row.push(format!("{:.2}", h.cash));
        row.push(format!("{:.2}", h.commission));
        row.push(format!("{:.2}", h.total));
        row.push(
            point
                .period_return
                .map(|r| format!("{r:.8}"))
                .unwrap_or_default(),
        );
        row.push(format!("{:.8}", point.growth));
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run.
///
/// Creates `{strategy}_{run_id prefix}/` under `output_dir` containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `equity.csv`: the holdings series
/// - `report.md`: the summary table
///
/// Returns the created directory. Re-running an identical config
/// overwrites the same directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(format!("{}_{}", result.strategy, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let manifest = run_dir.join("manifest.json");
    std::fs::write(&manifest, export_json(result)?)
        .with_context(|| format!("failed to write {}", manifest.display()))?;

    let equity = run_dir.join("equity.csv");
    std::fs::write(&equity, export_equity_csv(&result.equity_curve)?)
        .with_context(|| format!("failed to write {}", equity.display()))?;

    let report = run_dir.join("report.md");
    std::fs::write(&report, generate_report(result))
        .with_context(|| format!("failed to write {}", report.display()))?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(1024);
    md.push_str("# Backtest Report\n\n");

    md.push_str("| Field | Value |\n| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    md.push_str(&format!("| Symbols | {} |\n", result.config.data.symbols.join(", ")));
    md.push_str(&format!(
        "| Initial Capital | {:.2} |\n",
        result.config.backtest.initial_capital
    ));
    md.push_str(&format!("| Outcome | {:?} |\n", result.report.outcome));
    let stats = &result.report.stats;
    md.push_str(&format!("| Bars | {} |\n", stats.bars));
    md.push_str(&format!(
        "| Signals / Orders / Fills | {} / {} / {} |\n",
        stats.signals, stats.orders, stats.fills
    ));
    md.push_str(&format!("| Rejected Orders | {} |\n", stats.rejected_orders));
    md.push_str(&format!("| Rejected Signals | {} |\n", stats.rejected_signals));
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!("| Dataset Hash | {} |\n\n", result.dataset_hash));

    md.push_str("## Performance\n\n");
    md.push_str(&summary_table(&result.summary));
    md
}

/// The summary rows as a two-column Markdown table.
pub fn summary_table(summary: &PerformanceSummary) -> String {
    let mut md = String::from("| Metric | Value |\n| --- | --- |\n");
    for (label, value) in summary.rows() {
        md.push_str(&format!("| {label} | {value} |\n"));
    }
    md
}
