use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::defaults;
use crate::error::AnalyticsError;
use crate::series::TimeSeries;
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a linear trend extrapolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendForecastInput {
    /// Observed values. Irregular calendar gaps are allowed.
    pub series: TimeSeries,
    /// Number of future calendar days to project.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

pub(crate) fn default_horizon_days() -> u32 {
    defaults::HORIZON_DAYS
}

/// Least-squares line through (position, value).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; absent when the values are constant.
    pub r_squared: Option<f64>,
}

impl LinearFit {
    pub fn predict(&self, position: usize) -> f64 {
        self.slope * position as f64 + self.intercept
    }
}

/// Fitted line evaluated over the observed axis extended by the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendForecastOutput {
    pub fit: LinearFit,
    /// Observed timestamps followed by `horizon_days` daily steps.
    pub axis: Vec<NaiveDateTime>,
    /// Line value at every position of `axis`.
    pub predicted: Vec<f64>,
    pub observed_len: usize,
    pub horizon_days: u32,
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

/// Ordinary least squares on (i, values[i]) for i = 0..n.
///
/// Positions are ordinal, not elapsed time: samples are treated as evenly
/// spaced whatever their timestamps.
pub fn fit_linear(values: &[f64]) -> AnalyticsResult<LinearFit> {
    let n = values.len();
    if n < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "Linear fit requires at least 2 observations, got {n}"
        )));
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 {
        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum();
        Some(1.0 - ss_res / ss_tot)
    } else {
        None
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// True when every consecutive gap equals the first one.
fn evenly_spaced(axis: &[NaiveDateTime]) -> bool {
    let mut gaps = axis.windows(2).map(|w| w[1] - w[0]);
    match gaps.next() {
        Some(first) => gaps.all(|g| g == first),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fit a first-degree polynomial to the series and extrapolate it
/// `horizon_days` calendar days past the last observation.
pub fn forecast_trend(
    input: &TrendForecastInput,
) -> AnalyticsResult<ComputationOutput<TrendForecastOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    tracing::debug!(
        observations = input.series.len(),
        horizon_days = input.horizon_days,
        "fitting linear trend"
    );

    let values = input.series.values();
    let fit = fit_linear(&values)?;

    let mut axis = input.series.times();
    if !evenly_spaced(&axis) {
        warnings.push(
            "Observations are not evenly spaced; the trend is fitted on sample order, not elapsed time"
                .into(),
        );
    }

    let observed_len = axis.len();
    if let Some(&last) = axis.last() {
        axis.extend((1..=input.horizon_days as i64).map(|d| last + Duration::days(d)));
    }
    let predicted: Vec<f64> = (0..axis.len()).map(|i| fit.predict(i)).collect();

    let output = TrendForecastOutput {
        fit,
        axis,
        predicted,
        observed_len,
        horizon_days: input.horizon_days,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Linear Trend Forecast (OLS on sample index)",
        &serde_json::json!({
            "observations": observed_len,
            "horizon_days": input.horizon_days,
            "x_axis": "sample_index",
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn daily_series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let times = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        TimeSeries::from_parts(times, values.to_vec()).unwrap()
    }

    #[test]
    fn test_recovers_exact_line() {
        let values: Vec<f64> = (0..50).map(|i| 2.5 * i as f64 - 7.0).collect();
        let fit = fit_linear(&values).unwrap();
        assert!((fit.slope - 2.5).abs() < 1e-9, "slope={}", fit.slope);
        assert!((fit.intercept + 7.0).abs() < 1e-9, "intercept={}", fit.intercept);
        assert!((fit.r_squared.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolation_stays_on_line() {
        let values: Vec<f64> = (0..10).map(|i| -0.5 * i as f64 + 3.0).collect();
        let input = TrendForecastInput {
            series: daily_series(&values),
            horizon_days: 5,
        };
        let out = forecast_trend(&input).unwrap().result;
        assert_eq!(out.axis.len(), 15);
        for (i, v) in out.predicted.iter().enumerate() {
            assert!((v - (-0.5 * i as f64 + 3.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scenario_rising_prices() {
        let input = TrendForecastInput {
            series: daily_series(&[100.0, 101.0, 99.0, 105.0, 103.0, 108.0]),
            horizon_days: 2,
        };
        let out = forecast_trend(&input).unwrap().result;
        assert!(out.fit.slope > 0.0);
        assert_eq!(out.axis.len(), 8);
        assert_eq!(out.predicted.len(), 8);
        assert!(out.predicted[6] > out.predicted[5]);
        assert!(out.predicted[7] > out.predicted[5]);
        // 26 / 17.5
        assert!((out.fit.slope - 26.0 / 17.5).abs() < 1e-12);
    }

    #[test]
    fn test_future_axis_is_daily_after_last_date() {
        let input = TrendForecastInput {
            series: daily_series(&[1.0, 2.0, 3.0]),
            horizon_days: 3,
        };
        let out = forecast_trend(&input).unwrap().result;
        let last_observed = out.axis[2];
        for (k, t) in out.axis[3..].iter().enumerate() {
            assert_eq!(*t, last_observed + Duration::days(k as i64 + 1));
        }
    }

    #[test]
    fn test_insufficient_data() {
        let input = TrendForecastInput {
            series: daily_series(&[42.0]),
            horizon_days: 3,
        };
        assert!(matches!(
            forecast_trend(&input),
            Err(AnalyticsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_gaps_use_sample_index_and_warn() {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let times = vec![t0, t0 + Duration::days(1), t0 + Duration::days(10)];
        let series = TimeSeries::from_parts(times, vec![0.0, 1.0, 2.0]).unwrap();
        let out = forecast_trend(&TrendForecastInput {
            series,
            horizon_days: 1,
        })
        .unwrap();
        // Index-based: slope is 1 per sample even though the last gap is 9 days.
        assert!((out.result.fit.slope - 1.0).abs() < 1e-12);
        assert_eq!(out.result.axis[3], t0 + Duration::days(11));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_constant_series_has_no_r_squared() {
        let fit = fit_linear(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 5.0);
        assert!(fit.r_squared.is_none());
    }

    #[test]
    fn test_default_horizon() {
        let json = r#"{"series": [
            {"time": "2024-01-01T00:00:00", "value": 1.0},
            {"time": "2024-01-02T00:00:00", "value": 2.0}
        ]}"#;
        let input: TrendForecastInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.horizon_days, 30);
    }
}
