use chrono::NaiveDateTime;
use clap::Args;
use serde_json::Value;

use portfolio_analytics_core::indicators::overlays::candle_overlays;
use portfolio_analytics_core::indicators::{
    compute_overlays, BollingerParams, DisplayRange, Granularity, OverlayInput,
};
use portfolio_analytics_core::series::candles::{prepare_candles, CandleSetInput};
use portfolio_analytics_core::series::{CandleSet, OhlcvBar};
use portfolio_analytics_core::EngineConfig;

use super::{apply_flag, merge_section, read_request};

/// Arguments for candle aggregation
#[derive(Args)]
pub struct ResampleArgs {
    /// Path to JSON input file ({"bars": [...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Chart period: 1D, 1W, 1M, 6M, 1Y, ALL
    #[arg(long)]
    pub granularity: Option<Granularity>,
}

/// Arguments for EMA and Bollinger overlays
#[derive(Args)]
pub struct IndicatorArgs {
    /// Path to JSON input file with either raw "bars" or a "closes" series
    #[arg(long)]
    pub input: Option<String>,

    /// Chart period: 1D, 1W, 1M, 6M, 1Y, ALL
    #[arg(long)]
    pub granularity: Option<Granularity>,

    /// Bollinger rolling window
    #[arg(long)]
    pub bollinger_window: Option<usize>,

    /// Bollinger band width in standard deviations
    #[arg(long)]
    pub bollinger_multiplier: Option<f64>,

    /// Display everything from this timestamp (closes input only)
    #[arg(long, conflicts_with = "full")]
    pub since: Option<NaiveDateTime>,

    /// Display the whole history (closes input only)
    #[arg(long)]
    pub full: bool,
}

/// Flag, then request key, then config. A request key goes through
/// `FromStr` so an unknown period is an invalid parameter.
fn resolve_granularity(
    request: &mut Value,
    flag: Option<Granularity>,
    config: &EngineConfig,
) -> Result<Granularity, Box<dyn std::error::Error>> {
    let granularity = match (flag, request.get("granularity")) {
        (Some(g), _) => g,
        (None, Some(Value::String(key))) => key.parse()?,
        (None, Some(other)) => serde_json::from_value(other.clone())?,
        (None, None) => config.indicators.granularity,
    };
    apply_flag(request, "granularity", Some(granularity))?;
    Ok(granularity)
}

fn resolve_bollinger(
    request: &mut Value,
    args: &IndicatorArgs,
    config: &EngineConfig,
) -> Result<BollingerParams, Box<dyn std::error::Error>> {
    let mut params = merge_section(request, "bollinger", config.bollinger_params())?;
    if let Some(window) = args.bollinger_window {
        params.window = window;
    }
    if let Some(multiplier) = args.bollinger_multiplier {
        params.multiplier = multiplier;
    }
    apply_flag(request, "bollinger", Some(params))?;
    Ok(params)
}

pub fn run_resample(
    args: ResampleArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "candle resampling")?;
    resolve_granularity(&mut request, args.granularity, config)?;

    let candle_input: CandleSetInput = serde_json::from_value(request)?;
    let result = prepare_candles(&candle_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_indicators(
    args: IndicatorArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "technical indicators")?;
    let granularity = resolve_granularity(&mut request, args.granularity, config)?;
    let params = resolve_bollinger(&mut request, &args, config)?;

    if let Some(bars) = request.get("bars") {
        let bars: Vec<OhlcvBar> = serde_json::from_value(bars.clone())?;
        let set = CandleSet::build(&bars, granularity)?;
        let result = candle_overlays(&set, &params)?;
        return Ok(serde_json::to_value(result)?);
    }

    let display = if args.full {
        Some(DisplayRange::Full)
    } else {
        args.since.map(DisplayRange::Since)
    };
    apply_flag(&mut request, "display", display)?;

    let overlay_input: OverlayInput = serde_json::from_value(request)?;
    let result = compute_overlays(&overlay_input)?;
    Ok(serde_json::to_value(result)?)
}
