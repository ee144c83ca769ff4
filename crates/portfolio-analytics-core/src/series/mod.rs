pub mod candles;
pub mod granularity;
pub mod time_series;

pub use candles::{CandleSet, OhlcvBar, ResampleRule};
pub use granularity::Granularity;
pub use time_series::{IndicatorPoint, IndicatorSeries, TimePoint, TimeSeries};
