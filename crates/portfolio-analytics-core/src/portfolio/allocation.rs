use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::types::*;
use crate::AnalyticsResult;

use super::records::{latest_date, InstrumentType, Position};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which price values a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationBasis {
    /// quantity × current price
    #[default]
    Market,
    /// quantity × average purchase price
    Cost,
}

impl ValuationBasis {
    fn value(self, p: &Position) -> Money {
        match self {
            ValuationBasis::Market => p.market_value(),
            ValuationBasis::Cost => p.cost_basis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub positions: Vec<Position>,
    /// Valuation date; defaults to the latest date in `positions`.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub basis: ValuationBasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub instrument_type: InstrumentType,
    pub amount: Money,
    /// Share of the total; absent when the total is zero.
    pub weight: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutput {
    pub as_of: Option<NaiveDate>,
    pub basis: ValuationBasis,
    pub total: Money,
    pub slices: Vec<AllocationSlice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationDetailInput {
    pub positions: Vec<Position>,
    pub instrument_type: InstrumentType,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingAmount {
    pub name: String,
    pub amount: Money,
    pub weight: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDetailOutput {
    pub as_of: Option<NaiveDate>,
    pub instrument_type: InstrumentType,
    pub total: Money,
    pub holdings: Vec<HoldingAmount>,
}

fn weight(amount: Money, total: Money) -> Option<Rate> {
    if total.is_zero() {
        None
    } else {
        Some(amount / total)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Portfolio split by asset class on one date.
///
/// Shares, bonds and currency always appear (zero when absent), in that
/// order; any other types follow alphabetically.
pub fn allocation_by_type(
    input: &AllocationInput,
) -> AnalyticsResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    tracing::debug!(positions = input.positions.len(), basis = ?input.basis, "allocation by type");

    let as_of = input.as_of.or_else(|| latest_date(&input.positions));
    if as_of.is_none() {
        warnings.push("No positions supplied".into());
    }

    let mut core = [Decimal::ZERO; 3];
    let mut others: BTreeMap<String, Money> = BTreeMap::new();
    for p in input.positions.iter().filter(|p| Some(p.date) == as_of) {
        let value = input.basis.value(p);
        match &p.instrument_type {
            InstrumentType::Share => core[0] += value,
            InstrumentType::Bond => core[1] += value,
            InstrumentType::Currency => core[2] += value,
            InstrumentType::Other(name) => *others.entry(name.clone()).or_default() += value,
        }
    }

    let mut amounts: Vec<(InstrumentType, Money)> = vec![
        (InstrumentType::Share, core[0]),
        (InstrumentType::Bond, core[1]),
        (InstrumentType::Currency, core[2]),
    ];
    amounts.extend(others.into_iter().map(|(k, v)| (InstrumentType::Other(k), v)));

    let total: Money = amounts.iter().map(|(_, v)| *v).sum();
    let slices = amounts
        .into_iter()
        .map(|(instrument_type, amount)| AllocationSlice {
            instrument_type,
            amount,
            weight: weight(amount, total),
        })
        .collect();

    let output = AllocationOutput {
        as_of,
        basis: input.basis,
        total,
        slices,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Allocation by instrument type",
        &serde_json::json!({
            "as_of": as_of,
            "basis": input.basis,
            "positions": input.positions.len(),
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}

/// Market value per holding inside one asset class, largest first.
pub fn allocation_detail(
    input: &AllocationDetailInput,
) -> AnalyticsResult<ComputationOutput<AllocationDetailOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let as_of = input.as_of.or_else(|| latest_date(&input.positions));
    let mut by_name: BTreeMap<&str, Money> = BTreeMap::new();
    for p in input
        .positions
        .iter()
        .filter(|p| Some(p.date) == as_of && p.instrument_type == input.instrument_type)
    {
        *by_name.entry(p.name.as_str()).or_default() += p.market_value();
    }

    let total: Money = by_name.values().copied().sum();
    let mut holdings: Vec<HoldingAmount> = by_name
        .into_iter()
        .map(|(name, amount)| HoldingAmount {
            name: name.to_string(),
            amount,
            weight: weight(amount, total),
        })
        .collect();
    // BTreeMap order makes ties fall back to name order
    holdings.sort_by(|a, b| b.amount.cmp(&a.amount));

    let output = AllocationDetailOutput {
        as_of,
        instrument_type: input.instrument_type.clone(),
        total,
        holdings,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Allocation detail within instrument type (market value)",
        &serde_json::json!({
            "as_of": as_of,
            "instrument_type": input.instrument_type,
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn pos(day: u32, t: InstrumentType, name: &str, qty: Decimal, avg: Decimal, cur: Decimal) -> Position {
        Position {
            date: d(day),
            instrument_type: t,
            name: name.into(),
            quantity: qty,
            average_price: avg,
            current_price: cur,
            expected_yield: (cur - avg) * qty,
        }
    }

    fn book() -> Vec<Position> {
        vec![
            pos(1, InstrumentType::Share, "SBER", dec!(10), dec!(250), dec!(300)),
            pos(2, InstrumentType::Share, "SBER", dec!(10), dec!(250), dec!(310)),
            pos(2, InstrumentType::Share, "IRAO", dec!(100), dec!(4), dec!(3)),
            pos(2, InstrumentType::Bond, "OFZ 26238", dec!(2), dec!(900), dec!(950)),
            pos(2, InstrumentType::Other("etf".into()), "FXGD", dec!(5), dec!(20), dec!(20)),
        ]
    }

    #[test]
    fn test_market_allocation_uses_latest_date() {
        let out = allocation_by_type(&AllocationInput {
            positions: book(),
            as_of: None,
            basis: ValuationBasis::Market,
        })
        .unwrap()
        .result;
        assert_eq!(out.as_of, Some(d(2)));
        assert_eq!(out.slices.len(), 4);
        assert_eq!(out.slices[0].amount, dec!(3400));
        assert_eq!(out.slices[1].amount, dec!(1900));
        assert_eq!(out.slices[2].amount, Decimal::ZERO);
        assert_eq!(out.slices[3].instrument_type, InstrumentType::Other("etf".into()));
        assert_eq!(out.total, dec!(5400));
        let weights: Decimal = out.slices.iter().filter_map(|s| s.weight).sum();
        assert!((weights - Decimal::ONE).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_cost_basis_allocation() {
        let out = allocation_by_type(&AllocationInput {
            positions: book(),
            as_of: Some(d(2)),
            basis: ValuationBasis::Cost,
        })
        .unwrap()
        .result;
        assert_eq!(out.slices[0].amount, dec!(2900));
        assert_eq!(out.slices[1].amount, dec!(1800));
    }

    #[test]
    fn test_empty_positions() {
        let out = allocation_by_type(&AllocationInput {
            positions: vec![],
            as_of: None,
            basis: ValuationBasis::Market,
        })
        .unwrap();
        assert_eq!(out.result.total, Decimal::ZERO);
        assert!(out.result.slices.iter().all(|s| s.weight.is_none()));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_detail_sorted_descending() {
        let out = allocation_detail(&AllocationDetailInput {
            positions: book(),
            instrument_type: InstrumentType::Share,
            as_of: None,
        })
        .unwrap()
        .result;
        assert_eq!(out.holdings.len(), 2);
        assert_eq!(out.holdings[0].name, "SBER");
        assert_eq!(out.holdings[0].amount, dec!(3100));
        assert_eq!(out.holdings[1].name, "IRAO");
        assert_eq!(out.total, dec!(3400));
    }
}
