#![cfg(feature = "indicators")]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use portfolio_analytics_core::indicators::{
    compute_overlays, ema::ema, overlays::candle_overlays, BollingerParams, DisplayRange,
    Granularity, OverlayInput,
};
use portfolio_analytics_core::series::candles::{prepare_candles, CandleSetInput};
use portfolio_analytics_core::series::{CandleSet, OhlcvBar, TimeSeries};
use pretty_assertions::assert_eq;

fn t0() -> NaiveDateTime {
    // A Monday
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn price(i: usize) -> f64 {
    100.0 + 0.05 * i as f64 + 3.0 * (i as f64 / 9.0).sin()
}

fn hourly_bars(hours: usize) -> Vec<OhlcvBar> {
    (0..hours)
        .map(|i| {
            let close = price(i);
            OhlcvBar {
                time: t0() + Duration::hours(i as i64),
                open: close - 0.1,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 10.0,
            }
        })
        .collect()
}

/// Splitmix64 feeding Box-Muller: N(0, 1) draws from a fixed seed.
fn gaussian_draws(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut uniform = || {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n)
        .map(|_| {
            let u1 = 1.0 - uniform();
            let u2 = uniform();
            (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect()
}

fn daily_closes(n: usize) -> TimeSeries {
    let times = (0..n).map(|i| t0() + Duration::days(i as i64)).collect();
    let values = (0..n).map(price).collect();
    TimeSeries::from_parts(times, values).unwrap()
}

// ===========================================================================
// EMA reference scenario
// ===========================================================================

#[test]
fn test_constant_price_ema_is_exact() {
    let out = ema(&[50.0; 30], 10).unwrap();
    for (i, v) in out.iter().enumerate().skip(10) {
        assert_eq!(*v, Some(50.0), "sample {i}");
    }
    assert!(out[..9].iter().all(Option::is_none));
}

// ===========================================================================
// Full-history seeding
// ===========================================================================

#[test]
fn test_display_slice_matches_full_computation() {
    let closes = daily_closes(200);
    let full = compute_overlays(&OverlayInput {
        closes: closes.clone(),
        granularity: Granularity::SemiAnnual,
        display: DisplayRange::Full,
        bollinger: BollingerParams::default(),
    })
    .unwrap()
    .result;
    let period = compute_overlays(&OverlayInput {
        closes,
        granularity: Granularity::SemiAnnual,
        display: DisplayRange::Period,
        bollinger: BollingerParams::default(),
    })
    .unwrap()
    .result;

    // 6M shows the last 180 days: samples 19..200
    assert_eq!(period.ema_fast.len(), 181);
    assert_eq!(period.display_from, Some(t0() + Duration::days(19)));
    let offset = full.ema_slow.len() - period.ema_slow.len();
    assert_eq!(period.ema_slow.points[..], full.ema_slow.points[offset..]);
    assert_eq!(period.bollinger_upper.points[..], full.bollinger_upper.points[offset..]);
    // 6M slow window is 60, so the first displayed slow EMA is still warming up
    assert!(period.ema_slow.points[0].value.is_none());
    assert!(period.ema_fast.points[0].value.is_some());
}

#[test]
fn test_bands_bracket_mid_line() {
    let out = compute_overlays(&OverlayInput {
        closes: daily_closes(120),
        granularity: Granularity::Annual,
        display: DisplayRange::Full,
        bollinger: BollingerParams::default(),
    })
    .unwrap()
    .result;
    assert_eq!(out.bollinger_mid.warm_up_len(), 19);
    for i in 19..120 {
        let mid = out.bollinger_mid.points[i].value.unwrap();
        let up = out.bollinger_upper.points[i].value.unwrap();
        let lo = out.bollinger_lower.points[i].value.unwrap();
        assert!(lo <= mid && mid <= up);
        assert!(((up - mid) - (mid - lo)).abs() < 1e-9);
    }
}

#[test]
fn test_stationary_series_stays_inside_bands() {
    let n = 5000;
    let times = (0..n).map(|i| t0() + Duration::hours(i as i64)).collect();
    let closes: Vec<f64> = gaussian_draws(n, 2024)
        .into_iter()
        .map(|z| 50.0 + 1.5 * z)
        .collect();
    let out = compute_overlays(&OverlayInput {
        closes: TimeSeries::from_parts(times, closes.clone()).unwrap(),
        granularity: Granularity::AllTime,
        display: DisplayRange::Full,
        bollinger: BollingerParams::default(),
    })
    .unwrap()
    .result;

    // mean 50, sd 1.5: about 95% of post-warm-up closes sit inside the bands
    let inside = (19..n)
        .filter(|&i| {
            let up = out.bollinger_upper.points[i].value.unwrap();
            let lo = out.bollinger_lower.points[i].value.unwrap();
            lo <= closes[i] && closes[i] <= up
        })
        .count();
    let share = inside as f64 / (n - 19) as f64;
    assert!((0.93..=0.97).contains(&share), "share inside bands {share}");
}

#[test]
fn test_warm_up_values_serialise_as_null() {
    let out = compute_overlays(&OverlayInput {
        closes: daily_closes(40),
        granularity: Granularity::Monthly,
        display: DisplayRange::Full,
        bollinger: BollingerParams::default(),
    })
    .unwrap()
    .result;
    let json = serde_json::to_value(&out.ema_slow).unwrap();
    assert!(json["points"][0]["value"].is_null());
    assert!(json["points"][29]["value"].is_number());
}

// ===========================================================================
// Candle pipeline
// ===========================================================================

#[test]
fn test_monthly_candles_resample_to_days() {
    let set = prepare_candles(&CandleSetInput {
        bars: hourly_bars(60 * 24),
        granularity: Granularity::Monthly,
    })
    .unwrap()
    .result;

    assert_eq!(set.bars.len(), 60);
    assert_eq!(set.bars[1].time, t0() + Duration::days(1));
    assert_eq!(set.bars[0].volume, 240.0);
    assert_eq!(set.bars[0].close, price(23));
    // last bar is day 59; 30-day window starts at day 29
    assert_eq!(set.display_start, 29);
    assert_eq!(set.display().len(), 31);
}

#[test]
fn test_candle_overlays_align_with_display() {
    let set = CandleSet::build(&hourly_bars(60 * 24), Granularity::Monthly).unwrap();
    let out = candle_overlays(&set, &BollingerParams::default()).unwrap().result;
    assert_eq!(out.fast_window, 10);
    assert_eq!(out.slow_window, 30);
    assert_eq!(out.ema_fast.len(), set.display().len());
    assert_eq!(out.display_from, set.display_from());
    // slow EMA seeded at index 29, which is exactly the first displayed bar
    assert!(out.ema_slow.points.iter().all(|p| p.value.is_some()));
}

#[test]
fn test_weekly_buckets_close_on_sunday() {
    let set = CandleSet::build(&hourly_bars(21 * 24), Granularity::Annual).unwrap();
    assert_eq!(set.bars.len(), 3);
    assert_eq!(set.bars[0].time, t0() + Duration::days(6));
    assert_eq!(set.bars[2].time, t0() + Duration::days(20));
    assert_eq!(set.display_start, 0);
}

#[test]
fn test_granularity_from_key() {
    let g: Granularity = "6M".parse().unwrap();
    assert_eq!(g, Granularity::SemiAnnual);
    assert_eq!(g.ema_windows(), (20, 60));
    assert!("2Y".parse::<Granularity>().is_err());
}
