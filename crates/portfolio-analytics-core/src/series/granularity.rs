use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalyticsError;

use super::candles::ResampleRule;

/// Chart period selected by the caller. Drives candle aggregation, the
/// display window and the EMA window pair.
///
/// Deserialization goes through [`FromStr`], so an unknown key is an
/// `InvalidParameter` whichever way it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Granularity {
    #[default]
    #[serde(rename = "1D")]
    Intraday,
    #[serde(rename = "1W")]
    Weekly,
    #[serde(rename = "1M")]
    Monthly,
    #[serde(rename = "6M")]
    SemiAnnual,
    #[serde(rename = "1Y")]
    Annual,
    #[serde(rename = "ALL")]
    AllTime,
}

impl Granularity {
    pub const ALL: [Granularity; 6] = [
        Granularity::Intraday,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::SemiAnnual,
        Granularity::Annual,
        Granularity::AllTime,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Granularity::Intraday => "1D",
            Granularity::Weekly => "1W",
            Granularity::Monthly => "1M",
            Granularity::SemiAnnual => "6M",
            Granularity::Annual => "1Y",
            Granularity::AllTime => "ALL",
        }
    }

    /// (fast, slow) EMA windows in samples.
    pub fn ema_windows(self) -> (usize, usize) {
        match self {
            Granularity::Intraday => (20, 100),
            Granularity::Weekly => (20, 50),
            Granularity::Monthly => (10, 30),
            Granularity::SemiAnnual => (20, 60),
            Granularity::Annual => (10, 30),
            Granularity::AllTime => (10, 30),
        }
    }

    /// Aggregation applied to raw candles before display. `None` keeps raw bars.
    pub fn resample_rule(self) -> Option<ResampleRule> {
        match self {
            Granularity::Intraday => None,
            Granularity::Weekly => Some(ResampleRule::FourHour),
            Granularity::Monthly | Granularity::SemiAnnual => Some(ResampleRule::Daily),
            Granularity::Annual | Granularity::AllTime => Some(ResampleRule::Weekly),
        }
    }

    /// How far back from the latest bar the display window reaches. `None` shows everything.
    pub fn display_span(self) -> Option<Duration> {
        match self {
            Granularity::Intraday => Some(Duration::days(1)),
            Granularity::Weekly => Some(Duration::weeks(1)),
            Granularity::Monthly => Some(Duration::days(30)),
            Granularity::SemiAnnual => Some(Duration::days(180)),
            Granularity::Annual => Some(Duration::days(365)),
            Granularity::AllTime => None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Granularity {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "intraday" => Ok(Granularity::Intraday),
            "1w" | "weekly" => Ok(Granularity::Weekly),
            "1m" | "monthly" => Ok(Granularity::Monthly),
            "6m" | "semiannual" => Ok(Granularity::SemiAnnual),
            "1y" | "annual" => Ok(Granularity::Annual),
            "all" | "all-time" => Ok(Granularity::AllTime),
            other => Err(AnalyticsError::invalid(
                "granularity",
                format!("unknown key '{other}'. Use: 1D, 1W, 1M, 6M, 1Y, ALL"),
            )),
        }
    }
}

impl TryFrom<String> for Granularity {
    type Error = AnalyticsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys_and_names() {
        assert_eq!("1D".parse::<Granularity>().unwrap(), Granularity::Intraday);
        assert_eq!("6m".parse::<Granularity>().unwrap(), Granularity::SemiAnnual);
        assert_eq!("all-time".parse::<Granularity>().unwrap(), Granularity::AllTime);
        for g in Granularity::ALL {
            assert_eq!(g.key().parse::<Granularity>().unwrap(), g);
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = "2W".parse::<Granularity>().unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter { .. }));
    }

    #[test]
    fn test_ema_table() {
        assert_eq!(Granularity::Intraday.ema_windows(), (20, 100));
        assert_eq!(Granularity::Weekly.ema_windows(), (20, 50));
        assert_eq!(Granularity::SemiAnnual.ema_windows(), (20, 60));
        for g in Granularity::ALL {
            let (fast, slow) = g.ema_windows();
            assert!(fast >= 1 && fast < slow);
        }
    }

    #[test]
    fn test_serde_uses_keys() {
        assert_eq!(serde_json::to_value(Granularity::Annual).unwrap(), "1Y");
        let g: Granularity = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(g, Granularity::Monthly);
        let g: Granularity = serde_json::from_str("\"6m\"").unwrap();
        assert_eq!(g, Granularity::SemiAnnual);
    }

    #[test]
    fn test_serde_unknown_key_reports_invalid_parameter() {
        let err = serde_json::from_str::<Granularity>("\"2W\"").unwrap_err();
        assert!(err.to_string().contains("Invalid parameter granularity"));
    }
}
