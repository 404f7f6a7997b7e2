//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data_adapter::CsvDataAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::anomaly;
use crate::domain::config_validation::{validate_backtest_config, validate_vpa_config};
use crate::domain::error::VpascanError;
use crate::domain::ohlcv;
use crate::domain::pipeline::{self, PipelineConfig, PipelineReport, ScanAlert, SymbolSummary};
use crate::domain::simulator::TradeMode;
use crate::domain::universe::{min_universe_bars, parse_symbols, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// The mode pair every universe row is reported under.
pub const UNIVERSE_MODES: [TradeMode; 2] = [TradeMode::LongOnly, TradeMode::LongShort];

#[derive(Parser, Debug)]
#[command(name = "vpascan", about = "Volume price analysis backtester and scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single-symbol backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        mode: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest every watchlist symbol and summarize
    Universe {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report latest-bar anomalies across the watchlist
    Scan {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate configuration and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            mode,
            output,
        } => run_backtest(&config, symbol.as_deref(), mode.as_deref(), output.as_ref()),
        Command::Universe { config, output } => run_universe(&config, output.as_ref()),
        Command::Scan { config } => run_scan(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Shared head of every analysis command: load the INI, validate it and
/// resolve the pipeline parameters plus date range.
fn load_validated_config(
    config_path: &PathBuf,
) -> Result<(FileConfigAdapter, PipelineConfig, NaiveDate, NaiveDate), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    if let Err(e) = validate_vpa_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }

    let (start_date, end_date) = match build_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };

    let config = build_pipeline_config(&adapter);
    Ok((adapter, config, start_date, end_date))
}

pub fn build_pipeline_config(adapter: &dyn ConfigPort) -> PipelineConfig {
    let defaults = PipelineConfig::default();
    let mode = adapter
        .get_string("backtest", "mode")
        .and_then(|s| TradeMode::parse(&s))
        .unwrap_or(defaults.mode);

    PipelineConfig {
        lookback: adapter.get_int("vpa", "lookback", defaults.lookback as i64) as usize,
        hold_bars: adapter.get_int("backtest", "hold_bars", defaults.hold_bars as i64) as usize,
        cost_per_trade: adapter.get_double("backtest", "cost_per_trade", defaults.cost_per_trade),
        initial_equity: adapter.get_double("backtest", "initial_equity", defaults.initial_equity),
        mode,
    }
}

pub fn build_date_range(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), VpascanError> {
    let start = parse_config_date(adapter, "start_date")?;
    let end = parse_config_date(adapter, "end_date")?;
    Ok((start, end))
}

fn parse_config_date(adapter: &dyn ConfigPort, key: &str) -> Result<NaiveDate, VpascanError> {
    let value = adapter
        .get_string("backtest", key)
        .ok_or_else(|| VpascanError::ConfigMissing {
            section: "backtest".to_string(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| VpascanError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: "invalid date format (expected YYYY-MM-DD)".to_string(),
    })
}

/// CLI override, then `symbol`, then the first watchlist entry.
pub fn resolve_symbol(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Option<String> {
    if let Some(s) = symbol_override {
        return Some(s.to_uppercase());
    }
    if let Some(symbol) = config.get_string("backtest", "symbol") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            return Some(symbol);
        }
    }
    if let Some(list) = config.get_string("backtest", "symbols") {
        return list
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .find(|s| !s.is_empty());
    }
    None
}

/// The `symbols` watchlist, falling back to a single-entry `symbol`.
pub fn resolve_watchlist(config: &dyn ConfigPort) -> Result<Vec<String>, VpascanError> {
    if let Some(list) = config.get_string("backtest", "symbols") {
        return parse_symbols(&list).map_err(|e| VpascanError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
            reason: e.to_string(),
        });
    }
    if let Some(symbol) = config.get_string("backtest", "symbol") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            return Ok(vec![symbol]);
        }
    }
    Err(VpascanError::ConfigMissing {
        section: "backtest".to_string(),
        key: "symbols".to_string(),
    })
}

fn run_backtest(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    mode_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let (adapter, mut config, start_date, end_date) = match load_validated_config(config_path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    // Stage 2: Resolve overrides
    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Some(s) => s,
        None => {
            eprintln!("error: no symbol configured (use --symbol or set [backtest] symbol)");
            return ExitCode::from(2);
        }
    };
    if let Some(mode_str) = mode_override {
        match TradeMode::parse(mode_str) {
            Some(mode) => config.mode = mode,
            None => {
                eprintln!(
                    "error: unknown mode {:?} (expected long_only, short_only or long_short)",
                    mode_str
                );
                return ExitCode::from(2);
            }
        }
    }

    // Stage 3: Fetch bars
    let data_port = match CsvDataAdapter::from_config(&adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Fetching {} from {} to {}", symbol, start_date, end_date);
    let bars = match data_port.fetch_ohlcv(&symbol, start_date, end_date) {
        Ok(bars) => bars,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if bars.is_empty() {
        let e = VpascanError::NoData { symbol };
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  {} bars", bars.len());

    // Stage 4: Classify, simulate, measure
    let report = match pipeline::run_pipeline(&symbol, &bars, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Console summary
    print_metrics_block(&report);

    // Stage 6: Per-bar CSV
    let output = output_path
        .cloned()
        .or_else(|| adapter.get_string("report", "backtest_csv").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("vpa_backtest.csv"));
    let report_port = CsvReportAdapter::new();
    match report_port.write_backtest(&report, &output.to_string_lossy()) {
        Ok(()) => {
            eprintln!("\nBacktest series written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn print_metrics_block(report: &PipelineReport) {
    let m = &report.metrics;
    eprintln!("\n==================================================");
    eprintln!("  VPA {} ({})", report.mode.label(), report.symbol);
    eprintln!("==================================================");
    eprintln!("  Total Return:    {:>10.2}%", m.total_return * 100.0);
    eprintln!("  CAGR:            {:>10.2}%", m.cagr * 100.0);
    eprintln!("  Ann. Volatility: {:>10.2}%", m.volatility * 100.0);
    eprintln!("  Sharpe (approx): {:>10.2}", m.sharpe);
    eprintln!("  Max Drawdown:    {:>10.2}%", m.max_drawdown * 100.0);
    eprintln!("  Total Trades:    {:>10}", m.total_trades);
    eprintln!(
        "  Buy & Hold:      {:>10.2}%  (CAGR {:.2}%)",
        m.buy_hold_return * 100.0,
        m.buy_hold_cagr * 100.0
    );
    eprintln!("  Anomalies:");
    for kind in anomaly::AnomalyKind::ALL {
        eprintln!("    {:<22} {:>6}", kind.to_string(), m.anomalies.get(kind));
    }
}

/// One universe symbol's outcome: a summary row per mode, or the error
/// that disqualified the symbol.
type SymbolOutcome = Result<Vec<SymbolSummary>, (String, VpascanError)>;

/// Each symbol's backtests are independent; fan out with rayon when the
/// config allows it.
pub fn run_universe_backtests(
    data_port: &(dyn DataPort + Sync),
    symbols: &[String],
    config: &PipelineConfig,
    start_date: NaiveDate,
    end_date: NaiveDate,
    parallel: bool,
) -> Vec<SymbolOutcome> {
    let backtest_symbol = |symbol: &String| -> SymbolOutcome {
        let bars = data_port
            .fetch_ohlcv(symbol, start_date, end_date)
            .map_err(|e| (symbol.clone(), e))?;

        let mut rows = Vec::with_capacity(UNIVERSE_MODES.len());
        for mode in UNIVERSE_MODES {
            let report = pipeline::run_pipeline(symbol, &bars, &config.with_mode(mode))
                .map_err(|e| (symbol.clone(), e))?;
            rows.push(SymbolSummary::from_report(&report));
        }
        Ok(rows)
    };

    if parallel {
        symbols.par_iter().map(backtest_symbol).collect()
    } else {
        symbols.iter().map(backtest_symbol).collect()
    }
}

fn run_universe(config_path: &PathBuf, output_path: Option<&PathBuf>) -> ExitCode {
    // Stage 1: Load and validate config
    let (adapter, config, start_date, end_date) = match load_validated_config(config_path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    // Stage 2: Watchlist and data port
    let symbols = match resolve_watchlist(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let data_port = match CsvDataAdapter::from_config(&adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Universe validation
    eprintln!("Validating {} symbols...", symbols.len());
    let validation = match validate_universe(
        &data_port,
        symbols,
        start_date,
        end_date,
        min_universe_bars(config.lookback),
    ) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let universe = validation.universe;

    // Stage 4: Fan out per symbol
    let parallel = adapter.get_bool("backtest", "parallel", true);
    eprintln!(
        "Backtesting {} symbols, {} to {} ({})",
        universe.count(),
        start_date,
        end_date,
        if parallel { "parallel" } else { "sequential" }
    );
    let outcomes = run_universe_backtests(
        &data_port,
        &universe.symbols,
        &config,
        start_date,
        end_date,
        parallel,
    );

    let mut rows: Vec<SymbolSummary> = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(mut symbol_rows) => rows.append(&mut symbol_rows),
            Err((symbol, e)) => eprintln!("warning: skipping {} ({})", symbol, e),
        }
    }
    if rows.is_empty() {
        eprintln!("error: no symbols produced results");
        return ExitCode::from(5);
    }

    // Stage 5: Summary tables, best CAGR first
    rows.sort_by(|a, b| b.cagr.partial_cmp(&a.cagr).unwrap_or(std::cmp::Ordering::Equal));
    print_summary_tables(&rows);

    // Stage 6: Summary CSV
    let output = output_path
        .cloned()
        .or_else(|| adapter.get_string("report", "summary_csv").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("vpa_universe.csv"));
    let report_port = CsvReportAdapter::new();
    match report_port.write_summary(&rows, &output.to_string_lossy()) {
        Ok(()) => {
            eprintln!("\nSummary written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn print_summary_tables(rows: &[SymbolSummary]) {
    for mode in UNIVERSE_MODES {
        println!("\n=== {} (sorted by CAGR) ===", mode.label());
        println!(
            "{:<8} {:>6} {:>10} {:>9} {:>8} {:>9} {:>9}",
            "symbol", "trades", "total_ret", "cagr", "sharpe", "max_dd", "bh_cagr"
        );
        for row in rows.iter().filter(|r| r.mode == mode) {
            println!(
                "{:<8} {:>6} {:>9.2}% {:>8.2}% {:>8.2} {:>8.2}% {:>8.2}%",
                row.symbol,
                row.trades,
                row.total_return * 100.0,
                row.cagr * 100.0,
                row.sharpe,
                row.max_drawdown * 100.0,
                row.buy_hold_cagr * 100.0,
            );
        }
    }
}

fn run_scan(config_path: &PathBuf) -> ExitCode {
    // Stage 1: Load and validate config
    let (adapter, config, start_date, end_date) = match load_validated_config(config_path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    // Stage 2: Watchlist and data port
    let symbols = match resolve_watchlist(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let data_port = match CsvDataAdapter::from_config(&adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Classify each symbol, inspect its latest bar
    eprintln!("Scanning {} symbols for latest-bar anomalies", symbols.len());
    let mut alerts: Vec<ScanAlert> = Vec::new();
    let mut clean: Vec<String> = Vec::new();

    for symbol in &symbols {
        let bars = match data_port.fetch_ohlcv(symbol, start_date, end_date) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                continue;
            }
        };
        if bars.len() < config.lookback + 2 {
            eprintln!("warning: skipping {} (only {} bars)", symbol, bars.len());
            continue;
        }
        if let Err(e) = ohlcv::validate_series(&bars) {
            eprintln!("warning: skipping {} ({})", symbol, e);
            continue;
        }

        let classified = anomaly::classify_bars(&bars, config.lookback);
        match pipeline::scan_latest(&classified) {
            Some(alert) => alerts.push(alert),
            None => clean.push(symbol.clone()),
        }
    }

    // Stage 4: Alert table
    if alerts.is_empty() {
        println!("No anomalies on the latest bar.");
    } else {
        println!(
            "\n{:<8} {:<12} {:>10} {:>12}  {}",
            "symbol", "date", "close", "volume", "anomaly"
        );
        for alert in &alerts {
            println!(
                "{:<8} {:<12} {:>10.2} {:>12}  {}",
                alert.symbol, alert.date, alert.close, alert.volume, alert.anomaly
            );
        }
    }
    if !clean.is_empty() {
        println!("\nclean: {}", clean.join(", "));
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let data_port = match CsvDataAdapter::from_config(&adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Explicit symbol, else the watchlist, else everything on disk.
    let symbols = if let Some(s) = symbol_override {
        vec![s.to_uppercase()]
    } else {
        match resolve_watchlist(&adapter) {
            Ok(s) => s,
            Err(_) => match data_port.list_symbols() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        }
    };
    if symbols.is_empty() {
        println!("No symbols found.");
        return ExitCode::SUCCESS;
    }

    for symbol in &symbols {
        match data_port.get_data_range(symbol) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", symbol, count, min_date, max_date);
            }
            Ok(None) => println!("{}: no data found", symbol),
            Err(e) => eprintln!("error querying {}: {}", symbol, e),
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (adapter, config, start_date, end_date) = match load_validated_config(config_path) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    eprintln!("\nResolved parameters:");
    eprintln!("  lookback:       {}", config.lookback);
    eprintln!("  hold_bars:      {}", config.hold_bars);
    eprintln!("  cost_per_trade: {}", config.cost_per_trade);
    eprintln!("  initial_equity: {}", config.initial_equity);
    eprintln!("  mode:           {}", config.mode.label());
    eprintln!("  range:          {} to {}", start_date, end_date);
    if let Ok(symbols) = resolve_watchlist(&adapter) {
        eprintln!("  symbols:        {}", symbols.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
