use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::time::Instant;

use crate::config::defaults;
use crate::error::AnalyticsError;
use crate::series::TimeSeries;
use crate::stats::{self, HistogramBin};
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a one-day Monte Carlo Value-at-Risk estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarSimulationInput {
    /// Daily close prices, oldest first.
    pub prices: TimeSeries,
    /// Number of simulated terminal prices (minimum 1).
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Confidence level, strictly between 0 and 1.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// RNG seed. Identical inputs and seed give identical output.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Equal-width bins for the P&L histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

pub(crate) fn default_num_simulations() -> u32 {
    defaults::NUM_SIMULATIONS
}

pub(crate) fn default_confidence_level() -> f64 {
    defaults::CONFIDENCE_LEVEL
}

pub(crate) fn default_seed() -> u64 {
    defaults::SEED
}

pub(crate) fn default_histogram_bins() -> usize {
    defaults::HISTOGRAM_BINS
}

/// Gaussian model of daily log-returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnModel {
    pub mu: f64,
    pub sigma: f64,
    pub observations: usize,
}

/// Output of the Monte Carlo VaR simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSimulationOutput {
    pub last_price: f64,
    pub model: ReturnModel,
    pub confidence_level: f64,
    pub num_simulations: u32,
    /// Simulated terminal prices, in draw order.
    pub simulated_prices: Vec<f64>,
    /// Terminal price minus last price, in draw order.
    pub pnl: Vec<f64>,
    /// The (1 − confidence) percentile of `pnl`.
    pub threshold: f64,
    /// `-threshold`: positive when the lower tail is a loss.
    pub var: f64,
    /// Closed-form VaR under the same log-normal model.
    pub analytic_var: f64,
    pub histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Return model
// ---------------------------------------------------------------------------

/// ln(p[i] / p[i-1]) for consecutive prices. Prices must be positive.
pub fn log_returns(prices: &[f64]) -> AnalyticsResult<Vec<f64>> {
    if let Some(bad) = prices.iter().find(|p| **p <= 0.0) {
        return Err(AnalyticsError::InvalidSeries(format!(
            "log-returns need positive prices, found {bad}"
        )));
    }
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

/// Sample mean and standard deviation of the log-returns.
///
/// A single return has no sample deviation; sigma is then taken as zero.
pub fn fit_return_model(returns: &[f64]) -> AnalyticsResult<ReturnModel> {
    if returns.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "At least 2 prices (1 log-return) are required".into(),
        ));
    }
    Ok(ReturnModel {
        mu: stats::mean(returns),
        sigma: stats::sample_std_dev(returns).unwrap_or(0.0),
        observations: returns.len(),
    })
}

fn validate(input: &VarSimulationInput) -> AnalyticsResult<()> {
    if input.num_simulations < 1 {
        return Err(AnalyticsError::invalid("num_simulations", "Must be at least 1"));
    }
    if !(input.confidence_level > 0.0 && input.confidence_level < 1.0) {
        return Err(AnalyticsError::invalid(
            "confidence_level",
            "Confidence level must be between 0 and 1 (exclusive)",
        ));
    }
    if input.histogram_bins < 1 {
        return Err(AnalyticsError::invalid("histogram_bins", "Must be at least 1"));
    }
    if input.prices.len() < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "At least 2 prices are required for log-returns, got {}",
            input.prices.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate one-day VaR by simulating terminal prices from i.i.d. normal
/// log-returns fitted to the price history.
///
/// VaR is the negated (1 − confidence) percentile of simulated P&L, using
/// linear interpolation between order statistics.
pub fn simulate_var(
    input: &VarSimulationInput,
) -> AnalyticsResult<ComputationOutput<VarSimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    tracing::debug!(
        prices = input.prices.len(),
        simulations = input.num_simulations,
        confidence = input.confidence_level,
        seed = input.seed,
        "running Monte Carlo VaR"
    );

    validate(input)?;

    let prices = input.prices.values();
    let returns = log_returns(&prices)?;
    let model = fit_return_model(&returns)?;
    if model.observations < 2 {
        warnings.push("Only one log-return observed; sigma set to 0".into());
    }
    let last_price = prices[prices.len() - 1];

    let standard = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::InvalidParameter {
        field: "distribution".into(),
        reason: format!("Invalid Normal parameters: {e}"),
    })?;
    let mut rng = StdRng::seed_from_u64(input.seed);

    let n = input.num_simulations as usize;
    let mut simulated_prices = Vec::with_capacity(n);
    let mut pnl = Vec::with_capacity(n);
    for _ in 0..n {
        let draw = model.mu + model.sigma * rng.sample(standard);
        let price = last_price * draw.exp();
        simulated_prices.push(price);
        pnl.push(price - last_price);
    }

    let mut sorted = pnl.clone();
    sorted.sort_by(f64::total_cmp);
    let tail_pct = (1.0 - input.confidence_level) * 100.0;
    let threshold = stats::percentile_sorted(&sorted, tail_pct);
    let var = -threshold;
    if var < 0.0 {
        warnings.push(format!(
            "The {tail_pct:.2}th P&L percentile is a gain; VaR is negative"
        ));
    }

    let z = standard.inverse_cdf(1.0 - input.confidence_level);
    let analytic_var = last_price * (1.0 - (model.mu + model.sigma * z).exp());

    let output = VarSimulationOutput {
        last_price,
        model,
        confidence_level: input.confidence_level,
        num_simulations: input.num_simulations,
        simulated_prices,
        pnl,
        threshold,
        var,
        analytic_var,
        histogram: stats::build_histogram(&sorted, input.histogram_bins),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo VaR (i.i.d. normal log-returns, one-day horizon)",
        &serde_json::json!({
            "num_simulations": input.num_simulations,
            "confidence_level": input.confidence_level,
            "seed": input.seed,
            "price_observations": prices.len(),
            "return_std": "sample (n-1)",
        }),
        warnings,
        elapsed,
        Precision::Float,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
