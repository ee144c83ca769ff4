pub mod bollinger;
pub mod ema;
pub mod overlays;

pub use crate::series::Granularity;
pub use bollinger::{BollingerBands, BollingerParams};
pub use overlays::{compute_overlays, DisplayRange, OverlayInput, TechnicalOverlays};
