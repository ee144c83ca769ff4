use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Observed series
// ---------------------------------------------------------------------------

/// A single timestamped observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Ordered observations with strictly increasing timestamps and finite values.
///
/// Construction (including deserialisation) validates both properties, so
/// every computation downstream can rely on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimePoint>", into = "Vec<TimePoint>")]
pub struct TimeSeries {
    points: Vec<TimePoint>,
}

impl TimeSeries {
    pub fn new(points: Vec<TimePoint>) -> AnalyticsResult<Self> {
        for (i, p) in points.iter().enumerate() {
            if !p.value.is_finite() {
                return Err(AnalyticsError::InvalidSeries(format!(
                    "value at {} is not finite",
                    p.time
                )));
            }
            if i > 0 && points[i - 1].time >= p.time {
                return Err(AnalyticsError::InvalidSeries(format!(
                    "timestamps must be strictly increasing ({} follows {})",
                    p.time,
                    points[i - 1].time
                )));
            }
        }
        Ok(Self { points })
    }

    /// Build a series from parallel timestamp and value columns.
    pub fn from_parts(times: Vec<NaiveDateTime>, values: Vec<f64>) -> AnalyticsResult<Self> {
        if times.len() != values.len() {
            return Err(AnalyticsError::InvalidSeries(format!(
                "{} timestamps but {} values",
                times.len(),
                values.len()
            )));
        }
        Self::new(
            times
                .into_iter()
                .zip(values)
                .map(|(time, value)| TimePoint { time, value })
                .collect(),
        )
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }

    /// Index of the first observation at or after `start` (`len()` if none).
    pub fn position_at_or_after(&self, start: NaiveDateTime) -> usize {
        self.points.partition_point(|p| p.time < start)
    }
}

impl TryFrom<Vec<TimePoint>> for TimeSeries {
    type Error = AnalyticsError;

    fn try_from(points: Vec<TimePoint>) -> Result<Self, Self::Error> {
        TimeSeries::new(points)
    }
}

impl From<TimeSeries> for Vec<TimePoint> {
    fn from(series: TimeSeries) -> Self {
        series.points
    }
}

// ---------------------------------------------------------------------------
// Derived overlays
// ---------------------------------------------------------------------------

/// A derived value aligned to a source timestamp. `None` marks warm-up gaps,
/// which serialise as `null` and are distinct from a computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: NaiveDateTime,
    pub value: Option<f64>,
}

/// A derived series aligned one-to-one with its source price series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Pair computed values with the source timestamps.
    pub fn aligned(source: &TimeSeries, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(source.len(), values.len());
        Self {
            points: source
                .points()
                .iter()
                .zip(values)
                .map(|(p, value)| IndicatorPoint {
                    time: p.time,
                    value,
                })
                .collect(),
        }
    }

    /// The overlay restricted to `start..`, keeping values computed on the full history.
    pub fn slice_from(&self, start: usize) -> Self {
        let start = start.min(self.points.len());
        Self {
            points: self.points[start..].to_vec(),
        }
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of leading points without a value.
    pub fn warm_up_len(&self) -> usize {
        self.points
            .iter()
            .take_while(|p| p.value.is_none())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let err = TimeSeries::from_parts(vec![t(1), t(1)], vec![1.0, 2.0]);
        assert!(matches!(err, Err(AnalyticsError::InvalidSeries(_))));
    }

    #[test]
    fn test_rejects_decreasing_timestamps() {
        assert!(TimeSeries::from_parts(vec![t(2), t(1)], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_rejects_nan() {
        assert!(TimeSeries::from_parts(vec![t(1), t(2)], vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_rejects_mismatched_columns() {
        assert!(TimeSeries::from_parts(vec![t(1), t(2)], vec![1.0]).is_err());
    }

    #[test]
    fn test_deserialisation_validates() {
        let json = r#"[
            {"time": "2024-03-02T00:00:00", "value": 1.0},
            {"time": "2024-03-01T00:00:00", "value": 2.0}
        ]"#;
        assert!(serde_json::from_str::<TimeSeries>(json).is_err());

        let ok = r#"[{"time": "2024-03-01T00:00:00", "value": 2.0}]"#;
        let series: TimeSeries = serde_json::from_str(ok).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_position_at_or_after() {
        let s = TimeSeries::from_parts(vec![t(1), t(3), t(5)], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.position_at_or_after(t(1)), 0);
        assert_eq!(s.position_at_or_after(t(2)), 1);
        assert_eq!(s.position_at_or_after(t(5)), 2);
        assert_eq!(s.position_at_or_after(t(6)), 3);
    }

    #[test]
    fn test_missing_serialises_as_null() {
        let s = TimeSeries::from_parts(vec![t(1), t(2)], vec![0.0, 0.0]).unwrap();
        let overlay = IndicatorSeries::aligned(&s, vec![None, Some(0.0)]);
        let json = serde_json::to_value(&overlay).unwrap();
        assert!(json["points"][0]["value"].is_null());
        assert_eq!(json["points"][1]["value"], 0.0);
        assert_eq!(overlay.warm_up_len(), 1);
    }
}
