pub mod config;
pub mod error;
pub mod series;
pub mod stats;
pub mod types;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(feature = "indicators")]
pub mod indicators;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use config::EngineConfig;
pub use error::AnalyticsError;
pub use types::*;

/// Standard result type for all analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
