use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::defaults;
use crate::error::AnalyticsError;
use crate::types::*;
use crate::AnalyticsResult;

use super::records::{latest_date, InstrumentType, Payment, Position};

/// Input for the planned coupon yield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponIncomeInput {
    pub positions: Vec<Position>,
    pub payments: Vec<Payment>,
    /// Date of the bond holdings; defaults to the latest position date.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Calendar year of payments to count; defaults to the year of `as_of`.
    #[serde(default)]
    pub year: Option<i32>,
    /// Units of base currency per US dollar.
    #[serde(default = "default_usd_rate")]
    pub usd_rate: Decimal,
    /// Total invested capital; defaults to the cost basis of all positions on `as_of`.
    #[serde(default)]
    pub invested_capital: Option<Money>,
}

pub(crate) fn default_usd_rate() -> Decimal {
    defaults::USD_RATE
}

/// Payments on one day for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub date: NaiveDate,
    pub name: String,
    /// Sum in the payment currency.
    pub amount: Money,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponIncomeOutput {
    pub year: i32,
    pub bond_cost_basis: Money,
    pub invested_capital: Money,
    /// Payments due in `year`, converted to base currency.
    pub annual_coupons: Money,
    /// annual_coupons / invested_capital
    pub yield_on_capital: Option<Rate>,
    /// annual_coupons / bond_cost_basis
    pub yield_on_bonds: Option<Rate>,
    pub schedule: Vec<ScheduledPayment>,
}

fn ratio(num: Money, den: Money) -> Option<Rate> {
    if den.is_zero() {
        None
    } else {
        Some(num / den)
    }
}

/// Planned coupon income for a year and its yield on invested capital.
pub fn coupon_income(
    input: &CouponIncomeInput,
) -> AnalyticsResult<ComputationOutput<CouponIncomeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    tracing::debug!(
        positions = input.positions.len(),
        payments = input.payments.len(),
        "computing coupon income"
    );

    if input.usd_rate <= Decimal::ZERO {
        return Err(AnalyticsError::invalid("usd_rate", "Must be positive"));
    }

    let as_of = input.as_of.or_else(|| latest_date(&input.positions));
    let year = match (input.year, as_of) {
        (Some(y), _) => y,
        (None, Some(date)) => date.year(),
        (None, None) => {
            return Err(AnalyticsError::InsufficientData(
                "Either a year or dated positions are required".into(),
            ))
        }
    };

    let held: Vec<&Position> = input
        .positions
        .iter()
        .filter(|p| Some(p.date) == as_of)
        .collect();
    let bond_cost_basis: Money = held
        .iter()
        .filter(|p| p.instrument_type == InstrumentType::Bond)
        .map(|p| p.cost_basis())
        .sum();
    let invested_capital = input
        .invested_capital
        .unwrap_or_else(|| held.iter().map(|p| p.cost_basis()).sum());

    let mut annual_coupons = Decimal::ZERO;
    let mut grouped: BTreeMap<(NaiveDate, String, String), (Money, Currency)> = BTreeMap::new();
    for pay in input.payments.iter().filter(|p| p.payment_date.year() == year) {
        annual_coupons += match &pay.currency {
            Currency::Usd => pay.amount * input.usd_rate,
            Currency::Rub => pay.amount,
            Currency::Other(code) => {
                warnings.push(format!(
                    "Payment '{}' in {code} counted without conversion",
                    pay.name
                ));
                pay.amount
            }
        };
        let key = (
            pay.payment_date,
            pay.name.clone(),
            format!("{:?}", pay.currency),
        );
        grouped
            .entry(key)
            .or_insert((Decimal::ZERO, pay.currency.clone()))
            .0 += pay.amount;
    }

    let schedule = grouped
        .into_iter()
        .map(|((date, name, _), (amount, currency))| ScheduledPayment {
            date,
            name,
            amount,
            currency,
        })
        .collect();

    let output = CouponIncomeOutput {
        year,
        bond_cost_basis,
        invested_capital,
        annual_coupons,
        yield_on_capital: ratio(annual_coupons, invested_capital),
        yield_on_bonds: ratio(annual_coupons, bond_cost_basis),
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Planned coupon yield (annual payments / invested capital)",
        &serde_json::json!({
            "year": year,
            "as_of": as_of,
            "usd_rate": input.usd_rate.to_string(),
            "invested_capital_supplied": input.invested_capital.is_some(),
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}
