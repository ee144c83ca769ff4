use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::config::defaults;
use crate::error::AnalyticsError;
use crate::types::*;
use crate::AnalyticsResult;

use super::records::Position;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingInput {
    pub positions: Vec<Position>,
    /// Entries kept on each side.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Holdings never ranked (cash lines, unresolved instruments).
    #[serde(default = "default_excluded_names")]
    pub excluded_names: Vec<String>,
}

pub(crate) fn default_top_n() -> usize {
    defaults::TOP_N
}

pub(crate) fn default_excluded_names() -> Vec<String> {
    defaults::excluded_names()
}

/// Yield on cost of one holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedYield {
    pub rank: usize,
    pub name: String,
    pub yield_on_cost: Rate,
}

/// Change of yield on cost between the two latest dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChange {
    pub rank: usize,
    pub name: String,
    pub yield_today: Rate,
    pub yield_previous: Rate,
    pub change: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOutput<T> {
    pub as_of: NaiveDate,
    /// Highest first.
    pub best: Vec<T>,
    /// Lowest first.
    pub worst: Vec<T>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Yield on cost per name on `date`, summing duplicate lines.
/// Names with a zero cost basis are left out and counted.
fn yields_on(
    input: &RankingInput,
    date: NaiveDate,
) -> (BTreeMap<String, Rate>, usize) {
    let mut sums: BTreeMap<&str, (Money, Money)> = BTreeMap::new();
    for p in input.positions.iter().filter(|p| {
        p.date == date && !input.excluded_names.iter().any(|n| n == &p.name)
    }) {
        let entry = sums.entry(p.name.as_str()).or_default();
        entry.0 += p.expected_yield;
        entry.1 += p.cost_basis();
    }

    let mut skipped = 0;
    let mut out = BTreeMap::new();
    for (name, (profit, cost)) in sums {
        if cost.is_zero() {
            skipped += 1;
        } else {
            out.insert(name.to_string(), profit / cost);
        }
    }
    (out, skipped)
}

/// Top-n from each end. Ties keep name order.
fn split_ranks<T: Clone>(
    mut items: Vec<(String, Decimal, T)>,
    top_n: usize,
    with_rank: impl Fn(usize, T) -> T,
) -> (Vec<T>, Vec<T>) {
    items.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    let worst = items
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (_, _, t))| with_rank(i + 1, t.clone()))
        .collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let best = items
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (_, _, t))| with_rank(i + 1, t))
        .collect();
    (best, worst)
}

fn validate(input: &RankingInput) -> AnalyticsResult<()> {
    if input.top_n == 0 {
        return Err(AnalyticsError::invalid("top_n", "Must be at least 1"));
    }
    Ok(())
}

fn skipped_warning(skipped: usize, date: NaiveDate, warnings: &mut Vec<String>) {
    if skipped > 0 {
        warnings.push(format!(
            "{skipped} holdings on {date} have zero cost basis and were not ranked"
        ));
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Best and worst holdings by yield on cost on the latest date.
pub fn rank_by_total_yield(
    input: &RankingInput,
) -> AnalyticsResult<ComputationOutput<RankingOutput<RankedYield>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let as_of = input
        .positions
        .iter()
        .map(|p| p.date)
        .max()
        .ok_or_else(|| AnalyticsError::InsufficientData("No positions to rank".into()))?;

    let (yields, skipped) = yields_on(input, as_of);
    skipped_warning(skipped, as_of, &mut warnings);
    tracing::debug!(%as_of, ranked = yields.len(), "ranking by total yield");

    let items = yields
        .into_iter()
        .map(|(name, y)| {
            let entry = RankedYield {
                rank: 0,
                name: name.clone(),
                yield_on_cost: y,
            };
            (name, y, entry)
        })
        .collect();
    let (best, worst) = split_ranks(items, input.top_n, |rank, e| RankedYield { rank, ..e });

    let output = RankingOutput { as_of, best, worst };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Top holdings by yield on cost (expected yield / quantity × average price)",
        &serde_json::json!({
            "as_of": as_of,
            "top_n": input.top_n,
            "excluded_names": input.excluded_names,
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}

/// Best and worst holdings by change of yield on cost between the two
/// latest dates. Only names present on both dates are ranked.
pub fn rank_by_daily_change(
    input: &RankingInput,
) -> AnalyticsResult<ComputationOutput<RankingOutput<RankedChange>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let dates: BTreeSet<NaiveDate> = input.positions.iter().map(|p| p.date).collect();
    let mut latest = dates.iter().rev();
    let (today, previous) = match (latest.next(), latest.next()) {
        (Some(t), Some(p)) => (*t, *p),
        _ => {
            return Err(AnalyticsError::InsufficientData(
                "Positions on at least 2 distinct dates are required".into(),
            ))
        }
    };

    let (now, skipped_now) = yields_on(input, today);
    let (before, skipped_before) = yields_on(input, previous);
    skipped_warning(skipped_now, today, &mut warnings);
    skipped_warning(skipped_before, previous, &mut warnings);
    tracing::debug!(%today, %previous, "ranking by daily change");

    let items = now
        .into_iter()
        .filter_map(|(name, y_today)| {
            let y_prev = *before.get(&name)?;
            let change = y_today - y_prev;
            let entry = RankedChange {
                rank: 0,
                name: name.clone(),
                yield_today: y_today,
                yield_previous: y_prev,
                change,
            };
            Some((name, change, entry))
        })
        .collect();
    let (best, worst) = split_ranks(items, input.top_n, |rank, e| RankedChange { rank, ..e });

    let output = RankingOutput {
        as_of: today,
        best,
        worst,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Top holdings by day-over-day change in yield on cost",
        &serde_json::json!({
            "today": today,
            "previous": previous,
            "top_n": input.top_n,
            "excluded_names": input.excluded_names,
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        output,
    ))
}
