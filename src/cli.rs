//! CLI definition and dispatch.

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::accuracy::accuracy_report;
use crate::domain::calendar::MarketCalendar;
use crate::domain::config_validation::{
    parse_holiday, parse_time, parse_utc_offset, parse_weekday, validate_market_config,
    validate_scoring_config, validate_simulation_config,
};
use crate::domain::error::ForecastError;
use crate::domain::ohlcv::{normalize_ticker, Instrument};
use crate::domain::pipeline::IndicatorPipeline;
use crate::domain::simulator::{recommend, simulate};
use crate::domain::strategy::{SimulationConfig, TradingStrategy};
use crate::domain::validator::{PredictionValidator, ScoringConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::prediction_port::{PredictionFilter, PredictionStore};

#[derive(Parser, Debug)]
#[command(
    name = "forecastlab",
    about = "Technical indicators and prediction backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import a daily OHLCV CSV for one instrument
    ImportPrices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import a batch of predictions from CSV
    ImportPredictions {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute and store indicators
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
    },
    /// Resolve pending predictions whose target date has passed
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        /// Defaults to the local date
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Accuracy rollups over resolved predictions
    Accuracy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Replay resolved predictions through a simulated account
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        min_confidence: Option<f64>,
        #[arg(long)]
        position_size: Option<f64>,
        #[arg(long)]
        max_positions: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Trade recommendations for upcoming predictions
    Recommend {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        min_confidence: Option<f64>,
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Whether the exchange is open, and when it next opens
    MarketStatus {
        #[arg(short, long)]
        config: PathBuf,
        /// RFC 3339 instant; defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::InitDb { config } => run_init_db(&config),
        Command::ImportPrices {
            config,
            instrument,
            name,
            csv,
        } => run_import_prices(&config, &instrument, name.as_deref(), &csv),
        Command::ImportPredictions { config, csv } => run_import_predictions(&config, &csv),
        Command::Indicators { config, instrument } => {
            run_indicators(&config, instrument.as_deref())
        }
        Command::Validate {
            config,
            today,
            json,
        } => run_validate(&config, today, json),
        Command::Accuracy {
            config,
            instrument,
            model,
            json,
        } => run_accuracy(&config, instrument, model, json),
        Command::Simulate {
            config,
            min_confidence,
            position_size,
            max_positions,
            json,
        } => run_simulate(&config, min_confidence, position_size, max_positions, json),
        Command::Recommend {
            config,
            min_confidence,
            today,
            json,
        } => run_recommend(&config, min_confidence, today, json),
        Command::MarketStatus { config, at } => run_market_status(&config, at),
    }
}

fn fail(err: ForecastError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn open_store(config: &dyn ConfigPort) -> Result<SqliteAdapter, ExitCode> {
    let store = SqliteAdapter::from_config(config).map_err(fail)?;
    store.initialize_schema().map_err(fail)?;
    Ok(store)
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            ExitCode::from(1)
        }
    }
}

fn today_or_local(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub fn build_simulation_config(adapter: &dyn ConfigPort) -> Result<SimulationConfig, ForecastError> {
    validate_simulation_config(adapter)?;
    let defaults = SimulationConfig::default();
    Ok(SimulationConfig {
        starting_capital: adapter.get_double(
            "simulation",
            "starting_capital",
            defaults.starting_capital,
        ),
        fee_percent: adapter.get_double("simulation", "fee_percent", defaults.fee_percent),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<TradingStrategy, ForecastError> {
    validate_simulation_config(adapter)?;
    let defaults = TradingStrategy::default();
    Ok(TradingStrategy {
        min_confidence: adapter.get_double("simulation", "min_confidence", defaults.min_confidence),
        position_size: adapter.get_double("simulation", "position_size", defaults.position_size),
        max_positions_per_instrument: adapter.get_int(
            "simulation",
            "max_positions_per_instrument",
            defaults.max_positions_per_instrument as i64,
        ) as usize,
    })
}

pub fn build_scoring_config(adapter: &dyn ConfigPort) -> Result<ScoringConfig, ForecastError> {
    validate_scoring_config(adapter)?;
    let defaults = ScoringConfig::default();
    Ok(ScoringConfig {
        min_trade_confidence: adapter.get_double(
            "validation",
            "min_trade_confidence",
            defaults.min_trade_confidence,
        ),
        trade_fee_percent: adapter.get_double(
            "validation",
            "trade_fee_percent",
            defaults.trade_fee_percent,
        ),
    })
}

pub fn build_calendar(adapter: &dyn ConfigPort) -> Result<MarketCalendar, ForecastError> {
    validate_market_config(adapter)?;
    let mut calendar = MarketCalendar::default();

    if let Some(offset) = adapter.get_string("market", "utc_offset") {
        calendar.utc_offset = parse_utc_offset(&offset)?;
    }
    if let Some(open) = adapter.get_string("market", "open") {
        calendar.open_time = parse_time(&open, "open")?;
    }
    if let Some(close) = adapter.get_string("market", "close") {
        calendar.close_time = parse_time(&close, "close")?;
    }
    if adapter.get_string("market", "trading_days").is_some() {
        calendar.trading_days = adapter
            .get_list("market", "trading_days")
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<Result<_, _>>()?;
    }
    calendar.holidays = adapter
        .get_list("market", "holidays")
        .iter()
        .map(|d| parse_holiday(d))
        .collect::<Result<_, _>>()?;

    Ok(calendar)
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    match open_store(&config) {
        Ok(_) => {
            println!("Database schema initialized");
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

fn run_import_prices(
    config_path: &PathBuf,
    instrument: &str,
    name: Option<&str>,
    csv_path: &PathBuf,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let ticker = normalize_ticker(instrument);
    if ticker.is_empty() {
        eprintln!("error: --instrument must not be empty");
        return ExitCode::from(4);
    }

    info!("Reading prices from {}", csv_path.display());
    let points = match csv_adapter::read_prices(csv_path) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let instrument = Instrument {
        ticker: ticker.clone(),
        name: name.map_or_else(|| ticker.clone(), str::to_string),
    };
    if let Err(e) = store.insert_instrument(&instrument) {
        return fail(e);
    }

    match store.insert_prices(&ticker, &points) {
        Ok(inserted) => {
            println!(
                "{}: imported {} of {} price points ({} already recorded)",
                ticker,
                inserted,
                points.len(),
                points.len() - inserted
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_import_predictions(config_path: &PathBuf, csv_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    info!("Reading predictions from {}", csv_path.display());
    let predictions = match csv_adapter::read_predictions(csv_path) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let mut inserted = 0;
    for prediction in &predictions {
        match store.insert_prediction(prediction) {
            Ok(Some(_)) => inserted += 1,
            Ok(None) => {}
            Err(e) => return fail(e),
        }
    }
    println!(
        "Imported {} of {} predictions ({} already recorded)",
        inserted,
        predictions.len(),
        predictions.len() - inserted
    );
    ExitCode::SUCCESS
}

fn run_indicators(config_path: &PathBuf, instrument: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let pipeline = match IndicatorPipeline::new(&store, &store) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let results = match instrument {
        Some(ticker) => vec![pipeline.compute_indicators(&normalize_ticker(ticker))],
        None => pipeline.compute_all_indicators().results,
    };

    let mut failed = 0;
    for result in &results {
        match &result.error {
            None => {
                let note = if result.insufficient_history {
                    " (partial history)"
                } else {
                    ""
                };
                println!(
                    "{}: {} snapshots saved{}",
                    result.instrument, result.saved_count, note
                );
            }
            Some(err) => {
                failed += 1;
                println!("{}: failed: {}", result.instrument, err);
            }
        }
    }
    println!(
        "{} instruments processed, {} failed",
        results.len(),
        failed
    );

    if failed > 0 {
        ExitCode::from(5)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_validate(config_path: &PathBuf, today: Option<NaiveDate>, json: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let scoring = match build_scoring_config(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let calendar = match build_calendar(&config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let today = today_or_local(today);
    let validator = PredictionValidator::new(&store, &store)
        .with_config(scoring)
        .with_calendar(calendar);

    let summary = match validator.validate_predictions(today) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    for issue in &summary.skipped {
        warn!("prediction {} skipped: {}", issue.prediction_id, issue.error);
    }
    if json {
        return print_json(&summary.counts());
    }
    println!(
        "Validated {} predictions as of {}: {} correct, {} incorrect, {} pending price data",
        summary.validated,
        today,
        summary.correct,
        summary.incorrect,
        summary.skipped.len()
    );
    if summary.already_resolved > 0 {
        println!("{} were already resolved by another run", summary.already_resolved);
    }
    ExitCode::SUCCESS
}

fn run_accuracy(
    config_path: &PathBuf,
    instrument: Option<String>,
    model: Option<String>,
    json: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let filter = PredictionFilter {
        instrument: instrument.as_deref().map(normalize_ticker),
        model,
    };
    let resolved = match store.resolved_predictions(&filter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let report = accuracy_report(&resolved);

    if json {
        return print_json(&report);
    }

    let fmt_opt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
    println!("=== Prediction Accuracy ===");
    println!("Resolved:              {}", report.overall.total);
    println!("Correct:               {}", report.overall.correct);
    println!("Accuracy:              {:.1}%", report.overall.accuracy_percent);
    println!(
        "Confidence-weighted:   {:.1}%",
        report.overall.confidence_weighted_accuracy_percent
    );
    println!(
        "Avg price error:       {}%",
        fmt_opt(report.overall.avg_price_error_percent)
    );
    println!(
        "Avg trading return:    {}%",
        fmt_opt(report.overall.avg_trading_return)
    );

    if !report.by_instrument.is_empty() {
        println!("\n=== Per-Instrument ===");
        for (ticker, rollup) in &report.by_instrument {
            println!(
                "  {}:  {}/{} correct, {:.1}%, avg return {}%",
                ticker,
                rollup.correct,
                rollup.total,
                rollup.accuracy_percent,
                fmt_opt(rollup.avg_trading_return)
            );
        }
    }
    if !report.by_model.is_empty() {
        println!("\n=== Per-Model ===");
        for (model, rollup) in &report.by_model {
            println!(
                "  {}:  {}/{} correct, {:.1}%",
                model, rollup.correct, rollup.total, rollup.accuracy_percent
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_simulate(
    config_path: &PathBuf,
    min_confidence: Option<f64>,
    position_size: Option<f64>,
    max_positions: Option<usize>,
    json: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let mut strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let sim_config = match build_simulation_config(&config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    if let Some(c) = min_confidence {
        strategy.min_confidence = c;
    }
    if let Some(size) = position_size {
        strategy.position_size = size;
    }
    if let Some(max) = max_positions {
        strategy.max_positions_per_instrument = max;
    }
    if !(0.0..=1.0).contains(&strategy.min_confidence)
        || strategy.position_size <= 0.0
        || strategy.max_positions_per_instrument == 0
    {
        eprintln!(
            "error: min-confidence must be in [0, 1], position-size positive, max-positions at least 1"
        );
        return ExitCode::from(4);
    }

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let resolved = match store.resolved_predictions(&PredictionFilter::default()) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let result = simulate(&resolved, &strategy, &sim_config);

    if json {
        let skipped: Vec<serde_json::Value> = result
            .skipped
            .iter()
            .map(|s| {
                serde_json::json!({
                    "prediction_id": s.prediction_id,
                    "reason": s.error.to_string(),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "strategy": strategy,
            "summary": result.summary,
            "by_instrument": result.by_instrument,
            "trades": result.trades,
            "skipped": skipped,
        }));
    }

    let s = &result.summary;
    println!("=== Simulation Results ===");
    println!("Starting Capital: {:.2}", s.starting_capital);
    println!("Final Capital:    {:.2}", s.final_capital);
    println!(
        "Total Return:     {:+.2} ({:+.2}%)",
        s.total_return, s.total_return_percent
    );
    println!("Total Trades:     {}", s.total_trades);
    println!("Win Rate:         {:.1}%", s.win_rate);
    println!("Avg Win / Loss:   {:.2} / {:.2}", s.avg_win, s.avg_loss);
    println!("Largest W / L:    {:.2} / {:.2}", s.largest_win, s.largest_loss);
    println!("Sharpe Ratio:     {:.2}", s.sharpe_ratio);
    println!("Max Drawdown:     -{:.1}%", s.max_drawdown_percent);
    println!("Skipped:          {}", result.skipped.len());

    if !result.by_instrument.is_empty() {
        println!("\n=== Per-Instrument Summary ===");
        for (ticker, summary) in &result.by_instrument {
            println!(
                "  {}:  {} trades, {:.1}% win rate, {:+.2}",
                ticker, summary.total_trades, summary.win_rate, summary.total_return
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_recommend(
    config_path: &PathBuf,
    min_confidence: Option<f64>,
    today: Option<NaiveDate>,
    json: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let min_confidence = min_confidence.unwrap_or(strategy.min_confidence);
    if !(0.0..=1.0).contains(&min_confidence) {
        eprintln!("error: min-confidence must be in [0, 1]");
        return ExitCode::from(4);
    }

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let today = today_or_local(today);
    let upcoming = match store.unresolved_predictions(today) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let recommendations = recommend(&upcoming, min_confidence);
    if json {
        return print_json(&recommendations);
    }

    if recommendations.is_empty() {
        println!("No predictions at or above {:.0}% confidence", min_confidence * 100.0);
        return ExitCode::SUCCESS;
    }
    for rec in &recommendations {
        println!(
            "{:<6} {:<8} {}  {}",
            rec.action, rec.instrument, rec.target_date, rec.rationale
        );
    }
    ExitCode::SUCCESS
}

fn run_market_status(config_path: &PathBuf, at: Option<DateTime<Utc>>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let calendar = match build_calendar(&config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let at = at.unwrap_or_else(Utc::now);
    let status = calendar.status(at);
    let local = at.with_timezone(&calendar.utc_offset);

    println!(
        "Market is {} at {}",
        if status.is_open { "OPEN" } else { "CLOSED" },
        local.format("%Y-%m-%d %H:%M %:z")
    );
    match status.next_open {
        Some(next) => println!(
            "Next open: {}",
            next.with_timezone(&calendar.utc_offset)
                .format("%Y-%m-%d %H:%M %:z")
        ),
        None => {
            warn!("no trading day within the next year");
            println!("Next open: none scheduled");
        }
    }
    ExitCode::SUCCESS
}
