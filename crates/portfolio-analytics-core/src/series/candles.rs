use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AnalyticsError;
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::AnalyticsResult;

use super::granularity::Granularity;
use super::time_series::{TimePoint, TimeSeries};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One candle per sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    fn validate(&self) -> AnalyticsResult<()> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::InvalidSeries(format!(
                "bar at {} has a non-finite field",
                self.time
            )));
        }
        if self.low > self.high {
            return Err(AnalyticsError::InvalidSeries(format!(
                "bar at {} has low {} above high {}",
                self.time, self.low, self.high
            )));
        }
        if self.volume < 0.0 {
            return Err(AnalyticsError::InvalidSeries(format!(
                "bar at {} has negative volume",
                self.time
            )));
        }
        Ok(())
    }
}

/// Check field sanity and strictly increasing timestamps.
pub fn validate_bars(bars: &[OhlcvBar]) -> AnalyticsResult<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate()?;
        if i > 0 && bars[i - 1].time >= bar.time {
            return Err(AnalyticsError::InvalidSeries(format!(
                "bar timestamps must be strictly increasing ({} follows {})",
                bar.time,
                bars[i - 1].time
            )));
        }
    }
    Ok(())
}

/// Bucket rule for candle aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleRule {
    /// 4-hour buckets anchored at midnight, labelled by bucket start.
    FourHour,
    /// Calendar days, labelled at midnight.
    Daily,
    /// Monday..Sunday weeks, labelled by the closing Sunday at midnight.
    Weekly,
}

impl ResampleRule {
    /// Label of the bucket containing `t`.
    pub fn bucket_label(self, t: NaiveDateTime) -> NaiveDateTime {
        let date = t.date();
        match self {
            ResampleRule::FourHour => {
                let hour = t.hour() / 4 * 4;
                date.and_time(NaiveTime::MIN) + Duration::hours(hour as i64)
            }
            ResampleRule::Daily => date.and_time(NaiveTime::MIN),
            ResampleRule::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                (date + Duration::days(to_sunday)).and_time(NaiveTime::MIN)
            }
        }
    }
}

/// Aggregate bars into buckets: open=first, high=max, low=min, close=last,
/// volume=sum. Only buckets containing at least one bar are emitted.
///
/// Expects bars in strictly increasing time order.
pub fn resample(bars: &[OhlcvBar], rule: ResampleRule) -> Vec<OhlcvBar> {
    let mut out: Vec<OhlcvBar> = Vec::new();
    for bar in bars {
        let label = rule.bucket_label(bar.time);
        match out.last_mut() {
            Some(agg) if agg.time == label => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => out.push(OhlcvBar { time: label, ..*bar }),
        }
    }
    out
}

/// Close prices of a bar sequence as a validated series.
pub fn closes(bars: &[OhlcvBar]) -> AnalyticsResult<TimeSeries> {
    TimeSeries::new(
        bars.iter()
            .map(|b| TimePoint {
                time: b.time,
                value: b.close,
            })
            .collect(),
    )
}

/// Last close of each calendar day, e.g. hourly candles reduced to daily closes.
pub fn daily_closes(bars: &[OhlcvBar]) -> AnalyticsResult<TimeSeries> {
    validate_bars(bars)?;
    closes(&resample(bars, ResampleRule::Daily))
}

// ---------------------------------------------------------------------------
// Candle sets
// ---------------------------------------------------------------------------

/// Candles prepared for one chart period: the full aggregated history (for
/// indicator seeding) and where the display window begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSet {
    pub granularity: Granularity,
    pub bars: Vec<OhlcvBar>,
    /// Index into `bars` of the first displayed bar.
    pub display_start: usize,
}

impl CandleSet {
    pub fn build(bars: &[OhlcvBar], granularity: Granularity) -> AnalyticsResult<Self> {
        validate_bars(bars)?;
        let bars = match granularity.resample_rule() {
            Some(rule) => resample(bars, rule),
            None => bars.to_vec(),
        };
        let display_start = match (granularity.display_span(), bars.last()) {
            (Some(span), Some(last)) => {
                let from = last.time - span;
                bars.partition_point(|b| b.time < from)
            }
            _ => 0,
        };
        Ok(Self {
            granularity,
            bars,
            display_start,
        })
    }

    pub fn display(&self) -> &[OhlcvBar] {
        &self.bars[self.display_start..]
    }

    pub fn display_from(&self) -> Option<NaiveDateTime> {
        self.bars.get(self.display_start).map(|b| b.time)
    }

    pub fn closes(&self) -> AnalyticsResult<TimeSeries> {
        closes(&self.bars)
    }
}

/// Input for preparing candles for a chart period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleSetInput {
    pub bars: Vec<OhlcvBar>,
    #[serde(default)]
    pub granularity: Granularity,
}

/// Aggregate raw candles for the requested period and locate the display window.
pub fn prepare_candles(input: &CandleSetInput) -> AnalyticsResult<ComputationOutput<CandleSet>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    tracing::debug!(
        bars = input.bars.len(),
        granularity = %input.granularity,
        "preparing candle set"
    );

    let set = CandleSet::build(&input.bars, input.granularity)?;
    if set.bars.is_empty() {
        warnings.push("No candles supplied".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "OHLCV resampling (first/max/min/last/sum) with period display window",
        &serde_json::json!({
            "granularity": input.granularity,
            "resample_rule": input.granularity.resample_rule(),
            "raw_bars": input.bars.len(),
            "aggregated_bars": set.bars.len(),
            "displayed_bars": set.display().len(),
        }),
        warnings,
        elapsed,
        Precision::Float,
        set,
    ))
}
