mod gadm;
mod geometry;
mod memory;

use anyhow::Result;
use geo::Geometry;

pub use gadm::ShapefileSource;
pub use geometry::{GeometrySource, Region};
pub use memory::MemorySource;

/// One administrative unit as read from the boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub iso3: String,
    pub level: u8,
    /// GADM `GID_{level}` code (the ISO3 code itself at level 0).
    pub id: String,
    pub name: Option<String>,
    pub geometry: Geometry<f64>,
}

/// Read-only access to administrative boundaries by country and admin level.
pub trait BoundarySource: Send + Sync {
    /// All units of `iso3` at admin `level`, in dataset order.
    fn features(&self, iso3: &str, level: u8) -> Result<Vec<BoundaryFeature>>;
}
