use clap::Args;
use serde_json::Value;

use portfolio_analytics_core::monte_carlo::{simulate_var, VarSimulationInput};
use portfolio_analytics_core::series::candles::daily_closes;
use portfolio_analytics_core::series::OhlcvBar;
use portfolio_analytics_core::EngineConfig;

use super::{apply_flag, fill_default, read_request};

/// Arguments for Monte Carlo VaR
#[derive(Args)]
pub struct VarArgs {
    /// Path to JSON input file with daily "prices" or intraday "bars"
    #[arg(long)]
    pub input: Option<String>,

    /// Number of simulated one-day outcomes
    #[arg(long)]
    pub simulations: Option<u32>,

    /// Confidence level (e.g. 0.95 for 95%)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// RNG seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Histogram bins for the P&L distribution
    #[arg(long)]
    pub bins: Option<usize>,
}

pub fn run_var(args: VarArgs, config: &EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = read_request(args.input.as_deref(), "Monte Carlo VaR")?;

    // Intraday candles are reduced to one close per day
    if let Some(bars) = request.as_object_mut().and_then(|m| m.remove("bars")) {
        let bars: Vec<OhlcvBar> = serde_json::from_value(bars)?;
        apply_flag(&mut request, "prices", Some(daily_closes(&bars)?))?;
    }

    let sim = &config.simulation;
    fill_default(&mut request, "num_simulations", sim.num_simulations)?;
    fill_default(&mut request, "confidence_level", sim.confidence_level)?;
    fill_default(&mut request, "seed", sim.seed)?;
    fill_default(&mut request, "histogram_bins", sim.histogram_bins)?;
    apply_flag(&mut request, "num_simulations", args.simulations)?;
    apply_flag(&mut request, "confidence_level", args.confidence)?;
    apply_flag(&mut request, "seed", args.seed)?;
    apply_flag(&mut request, "histogram_bins", args.bins)?;

    let var_input: VarSimulationInput = serde_json::from_value(request)?;
    let result = simulate_var(&var_input)?;
    Ok(serde_json::to_value(result)?)
}
