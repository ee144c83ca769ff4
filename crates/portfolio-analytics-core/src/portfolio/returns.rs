use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::AnalyticsError;
use crate::types::*;
use crate::AnalyticsResult;

use super::records::{validate_rows, MetricRow};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ---------------------------------------------------------------------------
// Monthly returns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReturnsInput {
    pub rows: Vec<MetricRow>,
}

/// Change of the stored yield percentage within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    /// 1-based.
    pub month: u32,
    pub month_name: String,
    /// Percentage points, last row of the month minus the first.
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturnsOutput {
    /// Ordered by year then month.
    pub months: Vec<MonthlyReturn>,
    pub best: Option<MonthlyReturn>,
    pub worst: Option<MonthlyReturn>,
    pub mean: Option<Decimal>,
}

/// Month-by-month change of `expected_yield_percent`, for a year × month heatmap.
pub fn monthly_returns(
    input: &MonthlyReturnsInput,
) -> AnalyticsResult<ComputationOutput<MonthlyReturnsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_rows(&input.rows)?;

    // (first, last) per month; rows arrive in date order
    let mut buckets: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
    let mut missing = 0usize;
    for row in &input.rows {
        let Some(pct) = row.expected_yield_percent else {
            missing += 1;
            continue;
        };
        buckets
            .entry((row.date.year(), row.date.month()))
            .and_modify(|(_, last)| *last = pct)
            .or_insert((pct, pct));
    }
    if missing > 0 {
        warnings.push(format!(
            "{missing} rows without expected_yield_percent were skipped"
        ));
    }
    tracing::debug!(months = buckets.len(), "computed monthly buckets");

    let months: Vec<MonthlyReturn> = buckets
        .into_iter()
        .map(|((year, month), (first, last))| MonthlyReturn {
            year,
            month,
            month_name: MONTH_NAMES[(month - 1) as usize].to_string(),
            value: (last - first).round_dp(4),
        })
        .collect();

    let best = months.iter().max_by(|a, b| a.value.cmp(&b.value)).cloned();
    let worst = months.iter().min_by(|a, b| a.value.cmp(&b.value)).cloned();
    let mean = if months.is_empty() {
        None
    } else {
        let sum: Decimal = months.iter().map(|m| m.value).sum();
        Some(sum / Decimal::from(months.len()))
    };

    let output = MonthlyReturnsOutput {
        months,
        best,
        worst,
        mean,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly return (last minus first expected yield % within each month)",
        &serde_json::json!({
            "rows": input.rows.len(),
            "rounding_dp": 4,
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Portfolio versus market
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketComparisonInput {
    pub rows: Vec<MetricRow>,
}

/// Cumulative moves up to the step starting at `date`, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub portfolio: Decimal,
    pub market: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparisonOutput {
    pub points: Vec<ComparisonPoint>,
    /// Final portfolio minus final market; absent when there are no steps.
    pub portfolio_vs_market: Option<Decimal>,
}

/// Cumulative change of the portfolio yield percentage against the
/// cumulative percentage move of the benchmark index.
///
/// Each row is paired with its immediate successor. A step is kept only
/// when the successor carries both the yield percentage and the index
/// level; a side whose starting value is missing adds nothing to its total.
pub fn market_comparison(
    input: &MarketComparisonInput,
) -> AnalyticsResult<ComputationOutput<MarketComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_rows(&input.rows)?;

    let mut portfolio = Decimal::ZERO;
    let mut market = Decimal::ZERO;
    let mut points = Vec::with_capacity(input.rows.len().saturating_sub(1));
    let mut dropped = 0usize;
    for pair in input.rows.windows(2) {
        let (row, next) = (&pair[0], &pair[1]);
        let (Some(next_pct), Some(next_index)) = (next.expected_yield_percent, next.index_points)
        else {
            dropped += 1;
            continue;
        };
        if let Some(pct) = row.expected_yield_percent {
            portfolio += next_pct - pct;
        }
        if let Some(index) = row.index_points {
            if index.is_zero() {
                return Err(AnalyticsError::DivisionByZero {
                    context: format!("index level on {}", row.date),
                });
            }
            market += ((next_index - index) / index * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        }
        points.push(ComparisonPoint {
            date: row.date,
            portfolio,
            market,
        });
    }

    if dropped > 0 {
        warnings.push(format!(
            "{dropped} steps end on a row without the yield percentage or index level and were skipped"
        ));
    }
    if points.is_empty() {
        warnings.push("No comparable steps; comparison is empty".into());
    }

    let portfolio_vs_market = points.last().map(|p| p.portfolio - p.market);
    let points_len = points.len();
    let output = MarketComparisonOutput {
        points,
        portfolio_vs_market,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cumulative portfolio yield change vs cumulative index move",
        &serde_json::json!({
            "rows": input.rows.len(),
            "steps": points_len,
            "market_step_rounding_dp": 2,
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}
