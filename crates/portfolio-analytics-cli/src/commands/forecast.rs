use clap::Args;
use serde_json::Value;

use portfolio_analytics_core::forecast::trend::{self, TrendForecastInput};
use portfolio_analytics_core::EngineConfig;

use super::{apply_flag, fill_default, read_request};

/// Arguments for the linear trend forecast
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to JSON input file ({"series": [{"time", "value"}, ...]})
    #[arg(long)]
    pub input: Option<String>,

    /// Calendar days to extrapolate past the last observation
    #[arg(long)]
    pub horizon_days: Option<u32>,
}

pub fn run_forecast(
    args: ForecastArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "trend forecast")?;
    fill_default(&mut request, "horizon_days", config.forecast.horizon_days)?;
    apply_flag(&mut request, "horizon_days", args.horizon_days)?;

    let forecast_input: TrendForecastInput = serde_json::from_value(request)?;
    let result = trend::forecast_trend(&forecast_input)?;
    Ok(serde_json::to_value(result)?)
}
