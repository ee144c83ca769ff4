use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::AnalyticsError;
use crate::stats;
use crate::AnalyticsResult;

/// Bollinger band parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    /// Rolling window in samples.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Standard deviations between the mid line and each band.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_window() -> usize {
    defaults::BOLLINGER_WINDOW
}

fn default_multiplier() -> f64 {
    defaults::BOLLINGER_MULTIPLIER
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            window: default_window(),
            multiplier: default_multiplier(),
        }
    }
}

impl BollingerParams {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.window == 0 {
            return Err(AnalyticsError::invalid(
                "bollinger.window",
                "Must be at least 1",
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(AnalyticsError::invalid(
                "bollinger.multiplier",
                "Must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}

/// Mid line and envelope, aligned with the input prices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BollingerBands {
    pub mid: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Rolling mean ± multiplier × rolling population standard deviation.
///
/// The first `window - 1` positions are missing.
pub fn bollinger(values: &[f64], params: &BollingerParams) -> AnalyticsResult<BollingerBands> {
    params.validate()?;
    let n = values.len();
    let w = params.window;
    let mut bands = BollingerBands {
        mid: vec![None; n],
        upper: vec![None; n],
        lower: vec![None; n],
    };

    for end in w.saturating_sub(1)..n {
        let window = &values[end + 1 - w..=end];
        let mid = stats::mean(window);
        let width = params.multiplier * stats::population_std_dev(window);
        bands.mid[end] = Some(mid);
        bands.upper[end] = Some(mid + width);
        bands.lower[end] = Some(mid - width);
    }

    Ok(bands)
}
