mod clip;
mod zonal;

pub use clip::{ClipOutcome, RasterClipper};
pub use zonal::{ZonalAggregator, ZonalStat};
