//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_exchange::PaperExchange;
use crate::domain::allocation::{FixedAllocation, FixedNumberOfTrades};
use crate::domain::analysis::Analysis;
use crate::domain::coin::Coin;
use crate::domain::config_validation::{optional, required, validate_config};
use crate::domain::error::SigtraderError;
use crate::domain::expression::{parse_conditions, parse_indicators, parse_names};
use crate::domain::indicator::TechnicalIndicator;
use crate::domain::ohlcv::{CLOSE, TIME, format_time};
use crate::domain::order::{Order, Symbol};
use crate::domain::signal::Signal;
use crate::domain::strategy::{OrderEvent, Strategy};
use crate::domain::system_state::SystemState;
use crate::domain::table::Table;
use crate::ports::allocator_port::Allocator;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::exchange_port::{ExchangeClient, OrderReceipt};

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Indicator, condition and signal pipeline for OHLCV data")]
pub struct Cli {
    /// Log pipeline stages (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute one indicator over a kline CSV file
    Indicator {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long, value_enum, ignore_case = true)]
        kind: IndicatorKind,
        #[arg(short, long)]
        length: usize,
        /// Only use the last N rows of the file
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Print the analysis table (indicators, conditions, signal)
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the chronological order sequence
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Skip rows without an order
        #[arg(long)]
        placed_only: bool,
    },
    /// Place the latest row's orders on the in-memory paper exchange
    Paper {
        #[arg(short, long)]
        config: PathBuf,
        /// Holdings of the currency buy orders spend (the symbol's first leg)
        #[arg(long)]
        balance: Option<f64>,
    },
    /// Validate a configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Indicator {
            data,
            kind,
            length,
            tail,
        } => run_indicator(&data, kind, length, tail),
        Command::Analyze { config } => run_analyze(&config),
        Command::Backtest {
            config,
            placed_only,
        } => run_backtest(&config, placed_only),
        Command::Paper { config, balance } => run_paper(&config, balance),
        Command::Validate { config } => run_validate(&config),
    }
}

fn report(e: &SigtraderError) -> ExitCode {
    eprintln!("error: {e}");
    let mut source = e.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    ExitCode::from(e)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn build_data_port(config: &dyn ConfigPort) -> CsvAdapter {
    match usize::try_from(config.get_int("data", "tail", 0)) {
        Ok(rows) if rows > 0 => CsvAdapter::with_tail(rows),
        _ => CsvAdapter::new(),
    }
}

pub fn build_analysis(config: &dyn ConfigPort) -> Result<Analysis, SigtraderError> {
    let mut analysis = Analysis::new();
    for ti in parse_indicators(&required(config, "analysis", "indicators")?)? {
        analysis.add_ti(ti);
    }

    let mut condition_names = Vec::new();
    for condition in parse_conditions(&required(config, "analysis", "conditions")?)? {
        condition_names.push(analysis.add_condition(condition));
    }

    let signal = match optional(config, "analysis", "signal") {
        Some(names) => parse_names(&names)?,
        None => condition_names,
    };
    analysis.set_signal(Signal::all_conditions_true(signal));
    Ok(analysis)
}

pub fn build_strategy(
    config: &dyn ConfigPort,
    analysis: Analysis,
) -> Result<Strategy, SigtraderError> {
    let mut strategy = match optional(config, "strategy", "mode").as_deref() {
        Some("live") => Strategy::alternating_live(analysis),
        _ => Strategy::alternating_backtest(analysis),
    };

    let symbol = required(config, "strategy", "symbol")?;
    let amount = config.get_double("strategy", "amount", 0.0);
    if let Some(signal) = optional(config, "strategy", "buy_signal") {
        strategy.add_order(signal, Order::spot_market_buy(&symbol, amount)?)?;
    }
    if let Some(signal) = optional(config, "strategy", "sell_signal") {
        strategy.add_order(signal, Order::spot_market_sell(&symbol, amount)?)?;
    }
    Ok(strategy)
}

fn data_path(config: &dyn ConfigPort) -> Result<PathBuf, SigtraderError> {
    required(config, "data", "path").map(PathBuf::from)
}

pub fn run_analysis_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
) -> Result<Table, SigtraderError> {
    let analysis = build_analysis(config)?;
    let tohlcv = data_port.load_tohlcv(&data_path(config)?)?;
    info!(rows = tohlcv.len(), "klines loaded");
    analysis.calculate_analysis_data(&tohlcv)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
) -> Result<Vec<OrderEvent>, SigtraderError> {
    let strategy = build_strategy(config, build_analysis(config)?)?;
    let tohlcv = data_port.load_tohlcv(&data_path(config)?)?;
    info!(rows = tohlcv.len(), "klines loaded");
    strategy.execute_orders(&tohlcv)
}

/// `order_size` sizes every order the same, `trades` splits the balance.
pub fn build_allocation(
    config: &dyn ConfigPort,
) -> Result<Option<Box<dyn Allocator>>, SigtraderError> {
    if optional(config, "strategy", "order_size").is_some() {
        let size = config.get_double("strategy", "order_size", 0.0);
        return Ok(Some(Box::new(FixedAllocation::new(size)?)));
    }
    if optional(config, "strategy", "trades").is_some() {
        let trades = usize::try_from(config.get_int("strategy", "trades", 0)).unwrap_or(0);
        return Ok(Some(Box::new(FixedNumberOfTrades::new(trades)?)));
    }
    Ok(None)
}

/// Paper exchange funded with `balance` of the currency buy orders spend.
pub fn paper_exchange(
    config: &dyn ConfigPort,
    balance: Option<f64>,
) -> Result<PaperExchange, SigtraderError> {
    let Some(balance) = balance else {
        return Ok(PaperExchange::new());
    };
    let symbol = Symbol::parse(&required(config, "strategy", "symbol")?)?;
    let coin = Coin::new(symbol.base(), balance, balance)?;
    Ok(PaperExchange::with_balances(vec![coin]))
}

pub fn run_paper_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    exchange: &mut dyn ExchangeClient,
    balance: Option<f64>,
) -> Result<Vec<OrderReceipt>, SigtraderError> {
    let strategy = build_strategy(config, build_analysis(config)?)?;
    let tohlcv = data_port.load_tohlcv(&data_path(config)?)?;
    info!(rows = tohlcv.len(), "klines loaded");

    let mut state = SystemState::new();
    if let Some(balance) = balance {
        state.set_total_balance(balance)?;
    }
    let last_close = tohlcv
        .column(CLOSE)
        .and_then(|c| c.values().last())
        .and_then(|v| v.as_f64());
    if let Some(price) = last_close {
        state.set_current_price(price)?;
    }

    let allocation = build_allocation(config)?;
    let sizing = allocation.as_deref().map(|a| (a, &state));
    strategy.execute_live(&tohlcv, exchange, sizing)
}

/// One tab separated line per event: row, time, column, order.
pub fn format_event(event: &OrderEvent) -> String {
    let time = event
        .time
        .map(format_time)
        .unwrap_or_else(|| "-".to_string());
    let order = event
        .order
        .as_ref()
        .map(Order::to_string)
        .unwrap_or_else(|| "-".to_string());
    format!("{}\t{}\t{}\t{}", event.row, time, event.column, order)
}

/// TIME, CLOSE and the indicator columns of a kline CSV file.
pub fn indicator_table(
    data_port: &dyn DataPort,
    data: &Path,
    indicator: &TechnicalIndicator,
) -> Result<Table, SigtraderError> {
    let tohlcv = data_port.load_tohlcv(data)?;
    let values = indicator.calculate(&tohlcv)?;
    tohlcv.select(&[TIME, CLOSE])?.with_columns(values)
}

fn run_indicator(data: &Path, kind: IndicatorKind, length: usize, tail: Option<usize>) -> ExitCode {
    let indicator = match kind {
        IndicatorKind::Sma => TechnicalIndicator::sma(length),
        IndicatorKind::Ema => TechnicalIndicator::ema(length),
        IndicatorKind::Rsi => TechnicalIndicator::rsi(length),
    };
    let data_port = match tail {
        Some(rows) => CsvAdapter::with_tail(rows),
        None => CsvAdapter::new(),
    };

    match indicator.and_then(|ti| indicator_table(&data_port, data, &ti)) {
        Ok(table) => {
            println!("{table}");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_analyze(config_path: &Path) -> ExitCode {
    let result = load_config(config_path)
        .and_then(|config| run_analysis_pipeline(&build_data_port(&config), &config));
    match result {
        Ok(table) => {
            println!("{table}");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_backtest(config_path: &Path, placed_only: bool) -> ExitCode {
    let result = load_config(config_path)
        .and_then(|config| run_backtest_pipeline(&build_data_port(&config), &config));
    match result {
        Ok(events) => {
            for event in events
                .iter()
                .filter(|e| !placed_only || e.order.is_some())
            {
                println!("{}", format_event(event));
            }
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_paper(config_path: &Path, balance: Option<f64>) -> ExitCode {
    let result = load_config(config_path).and_then(|config| {
        let mut exchange = paper_exchange(&config, balance)?;
        let receipts =
            run_paper_pipeline(&build_data_port(&config), &config, &mut exchange, balance)?;
        Ok((receipts, exchange))
    });
    match result {
        Ok((receipts, exchange)) => {
            if receipts.is_empty() {
                eprintln!("No orders on the latest row");
            }
            for receipt in &receipts {
                let id = receipt
                    .order_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}\t{}\t{}\t{}",
                    id, receipt.side, receipt.amount, receipt.symbol
                );
            }
            for coin in exchange.balances() {
                eprintln!("{coin}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    match load_config(config_path) {
        Ok(_) => {
            eprintln!("Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}
