use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AnalyticsError;
use crate::forecast::trend::{default_horizon_days, forecast_trend, TrendForecastInput, TrendForecastOutput};
use crate::types::*;
use crate::AnalyticsResult;

use super::records::{validate_rows, value_series, MetricRow};

/// Input for the headline portfolio metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInput {
    /// Daily metric rows, oldest first.
    pub rows: Vec<MetricRow>,
}

/// Headline figures for the latest day against the day before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub value_today: Money,
    pub invested_today: Money,
    pub profit: Money,
    /// value / invested − 1
    pub return_today: Rate,
    pub return_yesterday: Rate,
    pub delta_return: Rate,
}

fn simple_return(row: &MetricRow) -> AnalyticsResult<Rate> {
    let invested = row.invested();
    if invested.is_zero() {
        return Err(AnalyticsError::DivisionByZero {
            context: format!("return on invested capital for {}", row.date),
        });
    }
    Ok(row.total_amount / invested - Decimal::ONE)
}

/// Latest value, invested capital, profit and the day-over-day return change.
pub fn portfolio_snapshot(
    input: &SnapshotInput,
) -> AnalyticsResult<ComputationOutput<PortfolioSnapshot>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();
    tracing::debug!(rows = input.rows.len(), "computing portfolio snapshot");

    validate_rows(&input.rows)?;
    let n = input.rows.len();
    if n < 2 {
        return Err(AnalyticsError::InsufficientData(
            "At least 2 metric rows (today and the previous day) are required".into(),
        ));
    }
    let today = &input.rows[n - 1];
    let yesterday = &input.rows[n - 2];

    let return_today = simple_return(today)?;
    let return_yesterday = simple_return(yesterday)?;

    let output = PortfolioSnapshot {
        date: today.date,
        value_today: today.total_amount,
        invested_today: today.invested(),
        profit: today.expected_yield,
        return_today,
        return_yesterday,
        delta_return: return_today - return_yesterday,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio snapshot (value, invested capital, day-over-day return)",
        &serde_json::json!({
            "rows": n,
            "today": today.date,
            "previous": yesterday.date,
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}

/// Input for extrapolating the portfolio value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueForecastInput {
    pub rows: Vec<MetricRow>,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

/// Linear trend of total portfolio value, extended `horizon_days` ahead.
pub fn value_forecast(
    input: &ValueForecastInput,
) -> AnalyticsResult<ComputationOutput<TrendForecastOutput>> {
    let series = value_series(&input.rows)?;
    forecast_trend(&TrendForecastInput {
        series,
        horizon_days: input.horizon_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(day: u32, total: Decimal, profit: Decimal) -> MetricRow {
        MetricRow {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            total_amount: total,
            expected_yield: profit,
            expected_yield_percent: None,
            index_points: None,
        }
    }

    #[test]
    fn test_snapshot_figures() {
        let input = SnapshotInput {
            rows: vec![
                row(1, dec!(1000), dec!(0)),
                row(2, dec!(1050), dec!(50)),
                row(3, dec!(1100), dec!(100)),
            ],
        };
        let out = portfolio_snapshot(&input).unwrap().result;
        assert_eq!(out.value_today, dec!(1100));
        assert_eq!(out.invested_today, dec!(1000));
        assert_eq!(out.profit, dec!(100));
        assert_eq!(out.return_today, dec!(0.1));
        assert_eq!(out.return_yesterday, dec!(0.05));
        assert_eq!(out.delta_return, dec!(0.05));
    }

    #[test]
    fn test_snapshot_needs_two_rows() {
        let input = SnapshotInput {
            rows: vec![row(1, dec!(1000), dec!(0))],
        };
        assert!(matches!(
            portfolio_snapshot(&input),
            Err(AnalyticsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_zero_invested_capital() {
        let input = SnapshotInput {
            rows: vec![row(1, dec!(10), dec!(10)), row(2, dec!(20), dec!(5))],
        };
        assert!(matches!(
            portfolio_snapshot(&input),
            Err(AnalyticsError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_value_forecast_extends_axis() {
        let input = ValueForecastInput {
            rows: (1..=10)
                .map(|d| row(d, Decimal::from(1000 + 10 * d), dec!(0)))
                .collect(),
            horizon_days: 5,
        };
        let out = value_forecast(&input).unwrap().result;
        assert_eq!(out.axis.len(), 15);
        assert!((out.fit.slope - 10.0).abs() < 1e-9);
        assert!((out.predicted[14] - 1150.0).abs() < 1e-6);
    }
}
