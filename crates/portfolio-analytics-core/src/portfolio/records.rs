use chrono::{NaiveDate, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::series::TimeSeries;
use crate::types::*;
use crate::AnalyticsResult;

/// One row of daily portfolio metrics as supplied by the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub date: NaiveDate,
    /// Market value of the whole portfolio.
    pub total_amount: Money,
    /// Unrealised profit over cost.
    pub expected_yield: Money,
    /// Unrealised profit in percentage points, as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_yield_percent: Option<Decimal>,
    /// Benchmark index level on the same date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_points: Option<Decimal>,
}

impl MetricRow {
    /// Capital actually invested: value minus unrealised profit.
    pub fn invested(&self) -> Money {
        self.total_amount - self.expected_yield
    }
}

/// Rows must be ordered by strictly increasing date.
pub(crate) fn validate_rows(rows: &[MetricRow]) -> AnalyticsResult<()> {
    for pair in rows.windows(2) {
        if pair[0].date >= pair[1].date {
            return Err(AnalyticsError::InvalidSeries(format!(
                "metric rows must have strictly increasing dates ({} follows {})",
                pair[1].date, pair[0].date
            )));
        }
    }
    Ok(())
}

/// Total portfolio value as a float series for statistical work.
pub fn value_series(rows: &[MetricRow]) -> AnalyticsResult<TimeSeries> {
    validate_rows(rows)?;
    let mut times = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let value = row.total_amount.to_f64().ok_or_else(|| {
            AnalyticsError::InvalidSeries(format!("total_amount on {} is not representable", row.date))
        })?;
        times.push(row.date.and_time(NaiveTime::MIN));
        values.push(value);
    }
    TimeSeries::from_parts(times, values)
}

/// Asset class of a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Share,
    Bond,
    /// Currency and precious-metal holdings.
    Currency,
    #[serde(untagged)]
    Other(String),
}

/// A holding on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub date: NaiveDate,
    pub instrument_type: InstrumentType,
    pub name: String,
    pub quantity: Decimal,
    pub average_price: Money,
    pub current_price: Money,
    #[serde(default)]
    pub expected_yield: Money,
}

impl Position {
    pub fn market_value(&self) -> Money {
        self.current_price * self.quantity
    }

    pub fn cost_basis(&self) -> Money {
        self.average_price * self.quantity
    }
}

/// Latest date present in the positions.
pub(crate) fn latest_date(positions: &[Position]) -> Option<NaiveDate> {
    positions.iter().map(|p| p.date).max()
}

/// A scheduled coupon or dividend payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_date: NaiveDate,
    pub name: String,
    pub amount: Money,
    #[serde(default)]
    pub currency: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(day: u32, total: Decimal) -> MetricRow {
        MetricRow {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            total_amount: total,
            expected_yield: dec!(10),
            expected_yield_percent: None,
            index_points: None,
        }
    }

    #[test]
    fn test_invested() {
        assert_eq!(row(1, dec!(110)).invested(), dec!(100));
    }

    #[test]
    fn test_value_series() {
        let s = value_series(&[row(1, dec!(100.5)), row(2, dec!(101))]).unwrap();
        assert_eq!(s.values(), vec![100.5, 101.0]);
    }

    #[test]
    fn test_unordered_rows_rejected() {
        assert!(value_series(&[row(2, dec!(1)), row(1, dec!(1))]).is_err());
    }

    #[test]
    fn test_instrument_type_serde() {
        let t: InstrumentType = serde_json::from_str("\"bond\"").unwrap();
        assert_eq!(t, InstrumentType::Bond);
        let other: InstrumentType = serde_json::from_str("\"etf\"").unwrap();
        assert_eq!(other, InstrumentType::Other("etf".into()));
    }
}
