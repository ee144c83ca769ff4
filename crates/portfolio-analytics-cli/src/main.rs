mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::forecast::ForecastArgs;
use commands::indicators::{IndicatorArgs, ResampleArgs};
use commands::portfolio::{AllocationArgs, CouponArgs, MetricsArgs, TopArgs, ValueForecastArgs};
use commands::risk::VarArgs;
use portfolio_analytics_core::EngineConfig;

/// Portfolio analytics: trend forecasts, technical overlays and Monte Carlo VaR
#[derive(Parser)]
#[command(
    name = "pfa",
    version,
    about = "Portfolio analytics: trend forecasts, technical overlays and Monte Carlo VaR",
    long_about = "A CLI for the portfolio analytics engine. Reads JSON requests from \
                  --input or stdin and prints the computation envelope. Defaults come \
                  from a YAML/JSON --config file and can be overridden per command."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine config file (.yaml, .yml or .json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log to stderr (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Linear trend fit extrapolated over a horizon of calendar days
    Forecast(ForecastArgs),
    /// Aggregate raw candles for a chart period
    Resample(ResampleArgs),
    /// EMA pair and Bollinger bands for a chart period
    Indicators(IndicatorArgs),
    /// Monte Carlo one-day Value at Risk
    Var(VarArgs),
    /// Latest value, invested capital and day-over-day return
    Snapshot(MetricsArgs),
    /// Linear forecast of total portfolio value
    ValueForecast(ValueForecastArgs),
    /// Allocation by instrument type, or by holding with --type
    Allocation(AllocationArgs),
    /// Planned coupon income and yield on capital
    Coupons(CouponArgs),
    /// Best and worst holdings
    Top(TopArgs),
    /// Month-by-month change of the portfolio yield
    MonthlyReturns(MetricsArgs),
    /// Cumulative portfolio yield against the benchmark index
    MarketComparison(MetricsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_config(path),
        None => Ok(EngineConfig::default()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Forecast(args) => commands::forecast::run_forecast(args, &config),
        Commands::Resample(args) => commands::indicators::run_resample(args, &config),
        Commands::Indicators(args) => commands::indicators::run_indicators(args, &config),
        Commands::Var(args) => commands::risk::run_var(args, &config),
        Commands::Snapshot(args) => commands::portfolio::run_snapshot(args, &config),
        Commands::ValueForecast(args) => commands::portfolio::run_value_forecast(args, &config),
        Commands::Allocation(args) => commands::portfolio::run_allocation(args, &config),
        Commands::Coupons(args) => commands::portfolio::run_coupons(args, &config),
        Commands::Top(args) => commands::portfolio::run_top(args, &config),
        Commands::MonthlyReturns(args) => commands::portfolio::run_monthly_returns(args, &config),
        Commands::MarketComparison(args) => {
            commands::portfolio::run_market_comparison(args, &config)
        }
        Commands::Version => {
            println!("pfa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
