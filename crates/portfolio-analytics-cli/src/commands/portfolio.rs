use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use portfolio_analytics_core::portfolio::allocation::{
    self, AllocationDetailInput, AllocationInput, ValuationBasis,
};
use portfolio_analytics_core::portfolio::income::{self, CouponIncomeInput};
use portfolio_analytics_core::portfolio::ranking::{self, RankingInput};
use portfolio_analytics_core::portfolio::records::InstrumentType;
use portfolio_analytics_core::portfolio::returns::{self, MarketComparisonInput, MonthlyReturnsInput};
use portfolio_analytics_core::portfolio::snapshot::{self, SnapshotInput, ValueForecastInput};
use portfolio_analytics_core::EngineConfig;

use super::{apply_flag, fill_default, read_request};

/// Arguments shared by commands that read daily metric rows
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON input file ({"rows": [...]})
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the portfolio value forecast
#[derive(Args)]
pub struct ValueForecastArgs {
    /// Path to JSON input file ({"rows": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Calendar days to extrapolate past the last row
    #[arg(long)]
    pub horizon_days: Option<u32>,
}

/// Arguments for allocation by instrument type
#[derive(Args)]
pub struct AllocationArgs {
    /// Path to JSON input file ({"positions": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Value holdings at market or at cost
    #[arg(long, value_enum)]
    pub basis: Option<BasisArg>,

    /// Break one instrument type (share, bond, currency, ...) down by holding
    #[arg(long = "type")]
    pub instrument_type: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasisArg {
    Market,
    Cost,
}

impl From<BasisArg> for ValuationBasis {
    fn from(b: BasisArg) -> Self {
        match b {
            BasisArg::Market => ValuationBasis::Market,
            BasisArg::Cost => ValuationBasis::Cost,
        }
    }
}

/// Arguments for planned coupon income
#[derive(Args)]
pub struct CouponArgs {
    /// Path to JSON input file ({"positions": [...], "payments": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Calendar year of payments to count
    #[arg(long)]
    pub year: Option<i32>,

    /// Units of base currency per US dollar
    #[arg(long)]
    pub usd_rate: Option<Decimal>,

    /// Invested capital to measure the yield against
    #[arg(long)]
    pub invested_capital: Option<Decimal>,
}

/// Arguments for best/worst holdings
#[derive(Args)]
pub struct TopArgs {
    /// Path to JSON input file ({"positions": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Ranking measure
    #[arg(long, value_enum, default_value = "total")]
    pub by: RankBy,

    /// Entries on each side
    #[arg(long)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RankBy {
    /// Yield on cost on the latest date
    Total,
    /// Change of yield on cost since the previous date
    Daily,
}

pub fn run_snapshot(
    args: MetricsArgs,
    _config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(args.input.as_deref(), "portfolio snapshot")?;
    let snapshot_input: SnapshotInput = serde_json::from_value(request)?;
    let result = snapshot::portfolio_snapshot(&snapshot_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_value_forecast(
    args: ValueForecastArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "value forecast")?;
    fill_default(&mut request, "horizon_days", config.forecast.horizon_days)?;
    apply_flag(&mut request, "horizon_days", args.horizon_days)?;
    let forecast_input: ValueForecastInput = serde_json::from_value(request)?;
    let result = snapshot::value_forecast(&forecast_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_allocation(
    args: AllocationArgs,
    _config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "allocation")?;

    if let Some(name) = args.instrument_type {
        let instrument_type: InstrumentType = serde_json::from_value(Value::String(name))?;
        apply_flag(&mut request, "instrument_type", Some(instrument_type))?;
        let detail_input: AllocationDetailInput = serde_json::from_value(request)?;
        let result = allocation::allocation_detail(&detail_input)?;
        return Ok(serde_json::to_value(result)?);
    }

    apply_flag(&mut request, "basis", args.basis.map(ValuationBasis::from))?;
    let alloc_input: AllocationInput = serde_json::from_value(request)?;
    let result = allocation::allocation_by_type(&alloc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_coupons(
    args: CouponArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "coupon income")?;
    fill_default(&mut request, "usd_rate", config.portfolio.usd_rate)?;
    apply_flag(&mut request, "usd_rate", args.usd_rate)?;
    apply_flag(&mut request, "year", args.year)?;
    apply_flag(&mut request, "invested_capital", args.invested_capital)?;
    let coupon_input: CouponIncomeInput = serde_json::from_value(request)?;
    let result = income::coupon_income(&coupon_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_top(args: TopArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "holding ranking")?;
    fill_default(&mut request, "top_n", config.portfolio.top_n)?;
    fill_default(&mut request, "excluded_names", &config.portfolio.excluded_names)?;
    apply_flag(&mut request, "top_n", args.top_n)?;
    let ranking_input: RankingInput = serde_json::from_value(request)?;
    let result = match args.by {
        RankBy::Total => serde_json::to_value(ranking::rank_by_total_yield(&ranking_input)?)?,
        RankBy::Daily => serde_json::to_value(ranking::rank_by_daily_change(&ranking_input)?)?,
    };
    Ok(result)
}

pub fn run_monthly_returns(
    args: MetricsArgs,
    _config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(args.input.as_deref(), "monthly returns")?;
    let monthly_input: MonthlyReturnsInput = serde_json::from_value(request)?;
    let result = returns::monthly_returns(&monthly_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_market_comparison(
    args: MetricsArgs,
    _config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(args.input.as_deref(), "market comparison")?;
    let comparison_input: MarketComparisonInput = serde_json::from_value(request)?;
    let result = returns::market_comparison(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}
