use analytics::distribution::clip_to_display_range;
use analytics::{
    AnalysisReport, AnalyticsEngine, DistributionBin, DrawdownEvent, DrawdownSummary,
    PerformanceStats, PeriodStats,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use configuration::{AnalysisConfig, PeriodUnit, PositionSizeType, load_config};
use core_types::RawTrade;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How many of the deepest drawdowns the table lists.
const DRAWDOWN_ROWS: usize = 10;

/// The main entry point for the tradestats analysis tool.
fn main() -> Result<()> {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args)?,
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance analytics for closed-trade histories.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a CSV export of closed trades.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Path to the trade CSV file (with a header row).
    #[arg(long, short)]
    trades: PathBuf,

    /// Path to a TOML configuration file. Defaults to `tradestats.toml` if present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Name of the column holding the trade close time.
    #[arg(long, default_value = "timestamp")]
    timestamp_column: String,

    /// Name of the column holding the absolute P&L.
    #[arg(long, default_value = "pnl")]
    pnl_column: String,

    /// Name of the column holding the percentage P&L, if the export has one.
    #[arg(long)]
    pnl_percent_column: Option<String>,

    #[arg(long)]
    initial_capital: Option<f64>,

    #[arg(long, value_enum)]
    position_size_type: Option<PositionSizeType>,

    #[arg(long)]
    position_size: Option<f64>,

    #[arg(long)]
    commission_rate: Option<f64>,

    #[arg(long, value_enum)]
    period_unit: Option<PeriodUnit>,

    #[arg(long)]
    period_length: Option<u32>,

    /// Print the full report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

impl AnalyzeArgs {
    /// Command-line values take precedence over the file and environment.
    fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(value) = self.initial_capital {
            config.initial_capital = value;
        }
        if let Some(value) = self.position_size_type {
            config.position_size_type = value;
        }
        if let Some(value) = self.position_size {
            config.position_size = value;
        }
        if let Some(value) = self.commission_rate {
            config.commission_rate = value;
        }
        if let Some(value) = self.period_unit {
            config.period_unit = value;
        }
        if let Some(value) = self.period_length {
            config.period_length = value;
        }
    }
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

#[derive(Serialize)]
struct JsonOutput<'a> {
    config: &'a AnalysisConfig,
    drawdown_summary: DrawdownSummary,
    report: &'a AnalysisReport,
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);

    let engine = AnalyticsEngine::new(config).context("Invalid analysis configuration")?;

    let raw = read_trades(&args)?;
    tracing::info!(rows = raw.len(), file = %args.trades.display(), "Loaded trade rows");

    let report = engine
        .analyze_raw(&raw)
        .with_context(|| format!("Failed to analyze {}", args.trades.display()))?;
    let drawdown_summary = DrawdownSummary::from_events(&report.drawdowns);

    if args.json {
        let output = JsonOutput {
            config: engine.config(),
            drawdown_summary,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let range_sd = engine.config().distribution_display_range_sd;
    println!("{}", summary_table(&report.overall));
    println!("\n--- Periods ---\n{}", periods_table(&report.periods));
    println!(
        "\n--- Drawdowns ({} total, {} recovered, longest {} days) ---\n{}",
        drawdown_summary.count,
        drawdown_summary.recovered,
        drawdown_summary.longest_days,
        drawdowns_table(&report.drawdowns)
    );
    println!(
        "\n--- Trade P&L Distribution ---\n{}",
        distribution_table(&clip_to_display_range(&report.pnl_distribution, range_sd))
    );
    if !report.drawdown_distribution.is_empty() {
        println!(
            "\n--- Drawdown Depth Distribution (%) ---\n{}",
            distribution_table(&clip_to_display_range(&report.drawdown_distribution, range_sd))
        );
    }

    Ok(())
}

/// Reads the trade export into raw rows using the configured column names.
fn read_trades(args: &AnalyzeArgs) -> Result<Vec<RawTrade>> {
    let path: &Path = &args.trades;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read the header row of {}", path.display()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .with_context(|| format!("Column '{}' not found in {}", name, path.display()))
    };

    let timestamp_idx = column(args.timestamp_column.as_str())?;
    let pnl_idx = column(args.pnl_column.as_str())?;
    let percent_idx = args.pnl_percent_column.as_deref().map(column).transpose()?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        // Line numbers are 1-based and count the header row.
        let record = record.with_context(|| format!("Malformed CSV record on line {}", line + 2))?;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let mut raw = RawTrade::new(field(timestamp_idx), field(pnl_idx));
        if let Some(idx) = percent_idx {
            raw = raw.with_percent(field(idx));
        }
        rows.push(raw);
    }

    Ok(rows)
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn summary_table(stats: &PerformanceStats) -> Table {
    let mut table = new_table(vec!["Metric", "Value"]);
    let rows = [
        ("Initial Equity", format!("{:.2}", stats.initial_equity)),
        ("Final Equity", format!("{:.2}", stats.final_equity)),
        ("Total P&L", format!("{:.2}", stats.total_pnl)),
        ("Total Return", format!("{:.2}%", stats.total_return_pct)),
        ("Annualized Return", format!("{:.2}%", stats.annualized_return_pct)),
        ("Elapsed Years", format!("{:.3}", stats.elapsed_years)),
        ("Sharpe Ratio", format!("{:.3}", stats.sharpe_ratio)),
        ("Sortino Ratio", format!("{:.3}", stats.sortino_ratio)),
        ("Calmar Ratio", format!("{:.3}", stats.calmar_ratio)),
        ("Omega Ratio", format!("{:.3}", stats.omega_ratio)),
        (
            "Max Drawdown",
            format!("{:.2}% ({:.2})", stats.max_drawdown_pct, stats.max_drawdown_usd),
        ),
        ("VaR 95 (daily)", format!("{:.2}", stats.var_95)),
        ("CVaR 95 (daily)", format!("{:.2}", stats.cvar_95)),
        (
            "Trading Days",
            format!(
                "{} ({} up / {} down)",
                stats.total_days, stats.winning_days, stats.losing_days
            ),
        ),
        ("Day Win Rate", format!("{:.2}%", stats.win_rate_pct)),
        ("Best / Worst Day", format!("{:.2} / {:.2}", stats.best_day, stats.worst_day)),
        (
            "Trades",
            format!(
                "{} ({} won / {} lost)",
                stats.total_trades, stats.winning_trades, stats.losing_trades
            ),
        ),
        ("Trade Win Rate", format!("{:.2}%", stats.trade_win_rate_pct)),
        ("Profit Factor", format!("{:.3}", stats.profit_factor)),
        ("Average Win / Loss", format!("{:.2} / {:.2}", stats.average_win, stats.average_loss)),
        ("Commission Paid", format!("{:.2}", stats.total_commission)),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table
}

fn periods_table(periods: &[PeriodStats]) -> Table {
    let mut table = new_table(vec![
        "#", "Start", "End", "Trades", "Return %", "Sharpe", "Max DD %", "Win Rate %",
    ]);
    for p in periods {
        table.add_row(vec![
            Cell::new(p.period.index),
            Cell::new(day(p.period.start.date())),
            Cell::new(day(p.period.end.date())),
            Cell::new(p.period.trade_count),
            Cell::new(format!("{:.2}", p.stats.total_return_pct)),
            Cell::new(format!("{:.3}", p.stats.sharpe_ratio)),
            Cell::new(format!("{:.2}", p.stats.max_drawdown_pct)),
            Cell::new(format!("{:.2}", p.stats.win_rate_pct)),
        ]);
    }
    table
}

fn drawdowns_table(events: &[DrawdownEvent]) -> Table {
    let mut table = new_table(vec![
        "Start", "Trough", "End", "Depth %", "Depth", "Days to Trough", "Days", "Recovered",
    ]);

    let mut deepest: Vec<&DrawdownEvent> = events.iter().collect();
    deepest.sort_by(|a, b| b.depth_pct.total_cmp(&a.depth_pct));

    for event in deepest.into_iter().take(DRAWDOWN_ROWS) {
        table.add_row(vec![
            Cell::new(day(event.start_date)),
            Cell::new(day(event.trough_date)),
            Cell::new(day(event.end_date)),
            Cell::new(format!("{:.2}", event.depth_pct)),
            Cell::new(format!("{:.2}", event.depth_usd)),
            Cell::new(event.to_trough_days),
            Cell::new(event.full_duration_days),
            Cell::new(if event.recovered { "yes" } else { "no" }),
        ]);
    }
    table
}

fn distribution_table(bins: &[DistributionBin]) -> Table {
    let mut table = new_table(vec!["SD", "From", "To", "Count", "%"]);
    for bin in bins {
        table.add_row(vec![
            Cell::new(format!("{:+.2}", bin.std_dev_position)),
            Cell::new(format!("{:.2}", bin.bin_start)),
            Cell::new(format!("{:.2}", bin.bin_end)),
            Cell::new(bin.count),
            Cell::new(format!("{:.1}", bin.percentage)),
        ]);
    }
    table
}
