use std::collections::BTreeMap;

use geo::{Area, Geometry, MultiPolygon, Simplify};
use serde::{Deserialize, Serialize};

use crate::common::geometry_kind;

/// Vertex tolerance and area thresholds (all in degrees) used to thin boundary
/// rings and strip slivers and outlying islands from multipolygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyPolicy {
    /// Ramer-Douglas-Peucker distance tolerance; 0 keeps every vertex.
    pub tolerance: f64,
    /// Multipolygons smaller than this are left untouched.
    pub small_area: f64,
    /// Multipolygons larger than this use the `lenient` threshold.
    pub large_area: f64,
    pub lenient: f64,
    pub strict: f64,
    /// Per-country thresholds that replace the size-based choice.
    pub overrides: BTreeMap<String, f64>,
}

impl Default for SimplifyPolicy {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            small_area: 0.01,
            large_area: 50.0,
            lenient: 0.1,
            strict: 0.001,
            overrides: ["CHL", "IDN", "RUS", "GRL", "CAN", "USA"].into_iter()
                .map(|iso3| (iso3.to_string(), 0.01))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// Every constituent polygon fell at or below the threshold.
    AllPartsBelowThreshold,
    /// Not a polygonal geometry.
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimplifyOutcome {
    Simplified(MultiPolygon<f64>),
    Unchanged(Geometry<f64>),
    Invalid(InvalidReason),
}

impl SimplifyPolicy {
    /// Minimum constituent area kept for a multipolygon of total `area` in `iso3`.
    pub fn threshold(&self, iso3: &str, area: f64) -> f64 {
        match self.overrides.get(iso3) {
            Some(&threshold) => threshold,
            None if area > self.large_area => self.lenient,
            None => self.strict,
        }
    }

    /// Remove vertices closer than `tolerance` to the simplified ring. Rings keep
    /// at least four coordinates; non-polygonal geometry is returned as-is.
    pub fn thin(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        match geometry {
            Geometry::Polygon(polygon) => Geometry::Polygon(polygon.simplify(&self.tolerance)),
            Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify(&self.tolerance)),
            other => other.clone(),
        }
    }

    /// Drop the constituent polygons of a multipolygon whose planar area is at or
    /// below the applicable threshold. Polygons and small multipolygons pass through.
    pub fn simplify(&self, geometry: &Geometry<f64>, iso3: &str) -> SimplifyOutcome {
        let mp = match geometry {
            Geometry::Polygon(_) => return SimplifyOutcome::Unchanged(geometry.clone()),
            Geometry::MultiPolygon(mp) => mp,
            other => return SimplifyOutcome::Invalid(InvalidReason::Unsupported(geometry_kind(other))),
        };

        let area = mp.unsigned_area();
        if area < self.small_area {
            return SimplifyOutcome::Unchanged(geometry.clone());
        }

        let threshold = self.threshold(iso3, area);
        let kept: Vec<_> = mp.0.iter()
            .filter(|polygon| polygon.unsigned_area() > threshold)
            .cloned()
            .collect();

        if kept.is_empty() {
            SimplifyOutcome::Invalid(InvalidReason::AllPartsBelowThreshold)
        } else {
            SimplifyOutcome::Simplified(MultiPolygon(kept))
        }
    }
}
