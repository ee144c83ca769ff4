use crate::error::AnalyticsError;
use crate::AnalyticsResult;

/// Smoothing factor for a span-style EMA: 2 / (window + 1).
pub fn smoothing_factor(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

/// Exponential moving average.
///
/// The recursion is seeded with the first price and applied to every sample,
/// but the first `window - 1` outputs are reported as missing because too
/// little history has been observed. A series shorter than the window yields
/// only missing values.
pub fn ema(values: &[f64], window: usize) -> AnalyticsResult<Vec<Option<f64>>> {
    if window == 0 {
        return Err(AnalyticsError::invalid("ema_window", "Must be at least 1"));
    }
    let alpha = smoothing_factor(window);

    let mut out = Vec::with_capacity(values.len());
    let mut current: Option<f64> = None;
    for (i, &price) in values.iter().enumerate() {
        let next = match current {
            // prev + a(x - prev): a constant input reproduces itself exactly
            Some(prev) => prev + alpha * (price - prev),
            None => price,
        };
        current = Some(next);
        out.push(if i + 1 >= window { Some(next) } else { None });
    }
    Ok(out)
}
