use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::series::Granularity;
use crate::AnalyticsResult;

/// Built-in defaults shared by the operation inputs and [`EngineConfig`].
pub mod defaults {
    use super::*;

    pub const HORIZON_DAYS: u32 = 30;
    pub const NUM_SIMULATIONS: u32 = 1_000;
    pub const CONFIDENCE_LEVEL: f64 = 0.95;
    pub const SEED: u64 = 42;
    pub const HISTOGRAM_BINS: usize = 80;
    pub const BOLLINGER_WINDOW: usize = 20;
    pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
    pub const TOP_N: usize = 5;
    pub const USD_RATE: Decimal = dec!(90);

    pub fn excluded_names() -> Vec<String> {
        vec!["Unknown".into(), "Российский рубль".into()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub horizon_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: defaults::HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorConfig {
    pub granularity: Granularity,
    pub bollinger_window: usize,
    pub bollinger_multiplier: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            bollinger_window: defaults::BOLLINGER_WINDOW,
            bollinger_multiplier: defaults::BOLLINGER_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub num_simulations: u32,
    pub confidence_level: f64,
    pub seed: u64,
    pub histogram_bins: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: defaults::NUM_SIMULATIONS,
            confidence_level: defaults::CONFIDENCE_LEVEL,
            seed: defaults::SEED,
            histogram_bins: defaults::HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Units of base currency per US dollar.
    pub usd_rate: Decimal,
    pub top_n: usize,
    pub excluded_names: Vec<String>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            usd_rate: defaults::USD_RATE,
            top_n: defaults::TOP_N,
            excluded_names: defaults::excluded_names(),
        }
    }
}

/// Engine-wide settings. Every section is optional in a config file;
/// missing keys take the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub forecast: ForecastConfig,
    pub indicators: IndicatorConfig,
    pub simulation: SimulationConfig,
    pub portfolio: PortfolioConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        let ind = &self.indicators;
        if ind.bollinger_window == 0 {
            return Err(AnalyticsError::invalid(
                "indicators.bollinger_window",
                "Must be at least 1",
            ));
        }
        if !ind.bollinger_multiplier.is_finite() || ind.bollinger_multiplier < 0.0 {
            return Err(AnalyticsError::invalid(
                "indicators.bollinger_multiplier",
                "Must be a finite, non-negative number",
            ));
        }

        let sim = &self.simulation;
        if sim.num_simulations == 0 {
            return Err(AnalyticsError::invalid(
                "simulation.num_simulations",
                "Must be at least 1",
            ));
        }
        if !(sim.confidence_level > 0.0 && sim.confidence_level < 1.0) {
            return Err(AnalyticsError::invalid(
                "simulation.confidence_level",
                "Must be strictly between 0 and 1",
            ));
        }
        if sim.histogram_bins == 0 {
            return Err(AnalyticsError::invalid(
                "simulation.histogram_bins",
                "Must be at least 1",
            ));
        }

        let pf = &self.portfolio;
        if pf.usd_rate <= Decimal::ZERO {
            return Err(AnalyticsError::invalid("portfolio.usd_rate", "Must be positive"));
        }
        if pf.top_n == 0 {
            return Err(AnalyticsError::invalid("portfolio.top_n", "Must be at least 1"));
        }
        Ok(())
    }

    #[cfg(feature = "indicators")]
    pub fn bollinger_params(&self) -> crate::indicators::BollingerParams {
        crate::indicators::BollingerParams {
            window: self.indicators.bollinger_window,
            multiplier: self.indicators.bollinger_multiplier,
        }
    }
}
