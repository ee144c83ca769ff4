use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::series::{CandleSet, Granularity, IndicatorSeries, TimeSeries};
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::AnalyticsResult;

use super::bollinger::{bollinger, BollingerParams};
use super::ema::ema;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which part of the history the caller wants to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "from", rename_all = "snake_case")]
pub enum DisplayRange {
    /// The span implied by the granularity, measured back from the last sample.
    #[default]
    Period,
    /// Everything at or after the given timestamp.
    Since(NaiveDateTime),
    /// The whole history.
    Full,
}

/// Input for the technical overlay computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayInput {
    /// Full available close history. Never pre-truncate to the display range.
    pub closes: TimeSeries,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub display: DisplayRange,
    #[serde(default)]
    pub bollinger: BollingerParams,
}

/// EMA pair and Bollinger bands restricted to the display range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalOverlays {
    pub granularity: Granularity,
    pub fast_window: usize,
    pub slow_window: usize,
    /// First displayed timestamp, absent when nothing is displayed.
    pub display_from: Option<NaiveDateTime>,
    pub ema_fast: IndicatorSeries,
    pub ema_slow: IndicatorSeries,
    pub bollinger_mid: IndicatorSeries,
    pub bollinger_upper: IndicatorSeries,
    pub bollinger_lower: IndicatorSeries,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

fn display_start(closes: &TimeSeries, granularity: Granularity, display: DisplayRange) -> usize {
    match display {
        DisplayRange::Full => 0,
        DisplayRange::Since(from) => closes.position_at_or_after(from),
        DisplayRange::Period => match (granularity.display_span(), closes.last()) {
            (Some(span), Some(last)) => closes.position_at_or_after(last.time - span),
            _ => 0,
        },
    }
}

/// Compute every overlay over the full history, then slice to `start..`.
fn overlays_from(
    closes: &TimeSeries,
    granularity: Granularity,
    params: &BollingerParams,
    start: usize,
    warnings: &mut Vec<String>,
) -> AnalyticsResult<TechnicalOverlays> {
    let (fast_window, slow_window) = granularity.ema_windows();
    let prices = closes.values();

    let longest = slow_window.max(params.window);
    if prices.len() < longest {
        warnings.push(format!(
            "History has {} samples, fewer than the largest window ({longest}); unseeded values are missing",
            prices.len()
        ));
    }

    let fast = IndicatorSeries::aligned(closes, ema(&prices, fast_window)?);
    let slow = IndicatorSeries::aligned(closes, ema(&prices, slow_window)?);
    let bands = bollinger(&prices, params)?;
    let mid = IndicatorSeries::aligned(closes, bands.mid);
    let upper = IndicatorSeries::aligned(closes, bands.upper);
    let lower = IndicatorSeries::aligned(closes, bands.lower);

    let shown = fast.slice_from(start);
    if shown.points.first().is_some_and(|p| p.value.is_none()) {
        warnings.push(format!(
            "{} displayed samples fall inside the fast EMA warm-up",
            shown.warm_up_len()
        ));
    }

    Ok(TechnicalOverlays {
        granularity,
        fast_window,
        slow_window,
        display_from: closes.points().get(start).map(|p| p.time),
        ema_fast: shown,
        ema_slow: slow.slice_from(start),
        bollinger_mid: mid.slice_from(start),
        bollinger_upper: upper.slice_from(start),
        bollinger_lower: lower.slice_from(start),
    })
}

/// EMA (fast/slow per granularity) and Bollinger bands for the display range.
///
/// Windows are always seeded on the full close history and only then sliced,
/// so the first displayed values equal those of the full-range computation.
pub fn compute_overlays(
    input: &OverlayInput,
) -> AnalyticsResult<ComputationOutput<TechnicalOverlays>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    tracing::debug!(
        samples = input.closes.len(),
        granularity = %input.granularity,
        "computing technical overlays"
    );

    input.bollinger.validate()?;
    let from = display_start(&input.closes, input.granularity, input.display);
    let output = overlays_from(
        &input.closes,
        input.granularity,
        &input.bollinger,
        from,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "EMA (span smoothing) and Bollinger Bands, computed on full history then sliced",
        &serde_json::json!({
            "granularity": input.granularity,
            "ema_windows": [output.fast_window, output.slow_window],
            "bollinger_window": input.bollinger.window,
            "bollinger_multiplier": input.bollinger.multiplier,
            "history_len": input.closes.len(),
            "display_start": from,
        }),
        warnings,
        elapsed,
        Precision::Float,
        output,
    ))
}

/// Overlays for a prepared candle set, displayed over its own display window.
pub fn candle_overlays(
    set: &CandleSet,
    params: &BollingerParams,
) -> AnalyticsResult<ComputationOutput<TechnicalOverlays>> {
    let input = OverlayInput {
        closes: set.closes()?,
        granularity: set.granularity,
        display: match set.display_from() {
            Some(from) => DisplayRange::Since(from),
            None => DisplayRange::Full,
        },
        bollinger: *params,
    };
    compute_overlays(&input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
