use anyhow::{Context, Result, anyhow};
use geo::{Geometry, MultiPolygon};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    common,
    geom::{InvalidReason, SimplifyOutcome, SimplifyPolicy},
    source::{BoundaryFeature, BoundarySource},
};

/// A leaf administrative unit with cleaned geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub iso3: String,
    pub level: u8,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl Region {
    /// Encode regions as a GeoJSON FeatureCollection with `GID_0`, `GID_id`,
    /// `GID_level` and `name` properties.
    pub fn to_geojson(regions: &[Region]) -> Result<Vec<u8>> {
        let features: Vec<_> = regions.iter()
            .map(|r| (r.geometry.clone(), json!({
                "GID_0": r.iso3,
                "GID_id": r.id,
                "GID_level": r.level,
                "name": r.name,
            })))
            .collect();
        common::write_to_geojson_bytes(&features)
    }

    pub fn from_geojson(bytes: &[u8]) -> Result<Vec<Region>> {
        common::read_from_geojson_bytes(bytes)?
            .into_iter()
            .enumerate()
            .map(|(i, (geometry, props))| {
                let field = |name: &str| props[name].as_str().map(str::to_string)
                    .ok_or_else(|| anyhow!("feature {i}: missing string property {name:?}"));
                Ok(Region {
                    iso3: field("GID_0")?,
                    id: field("GID_id")?,
                    level: props["GID_level"].as_u64()
                        .and_then(|l| u8::try_from(l).ok())
                        .ok_or_else(|| anyhow!("feature {i}: missing property \"GID_level\""))?,
                    name: props["name"].as_str().map(str::to_string),
                    geometry,
                })
            })
            .collect()
    }
}

/// Boundaries for one country, cleaned by a [`SimplifyPolicy`].
pub struct GeometrySource<'a> {
    source: &'a dyn BoundarySource,
    policy: &'a SimplifyPolicy,
}

impl<'a> GeometrySource<'a> {
    pub fn new(source: &'a dyn BoundarySource, policy: &'a SimplifyPolicy) -> Self {
        Self { source, policy }
    }

    /// The simplified level-0 outline, merging all level-0 parts of the country.
    /// `None` if the dataset has no outline for `iso3`.
    pub fn national_outline(&self, iso3: &str) -> Result<Option<MultiPolygon<f64>>> {
        let features = self.source.features(iso3, 0)
            .with_context(|| format!("read national outline of {iso3}"))?;

        let mut parts = Vec::new();
        for feature in &features {
            match common::as_multipolygon(&feature.geometry) {
                Some(mp) => parts.extend(mp.0),
                None => warn!(iso3, kind = common::geometry_kind(&feature.geometry), "ignoring non-polygonal outline part"),
            }
        }
        if parts.is_empty() {
            return Ok(None);
        }

        let geometry = if parts.len() == 1 {
            Geometry::Polygon(parts.remove(0))
        } else {
            Geometry::MultiPolygon(MultiPolygon(parts))
        };
        Ok(self.clean(iso3, iso3, &geometry))
    }

    /// Simplified regions of `iso3` at admin `level`. Units whose geometry cannot
    /// be used are dropped with a warning.
    pub fn regions(&self, iso3: &str, level: u8) -> Result<Vec<Region>> {
        let features = self.source.features(iso3, level)
            .with_context(|| format!("read level {level} regions of {iso3}"))?;
        let total = features.len();

        let regions: Vec<_> = features.into_iter()
            .filter_map(|BoundaryFeature { iso3, level, id, name, geometry }| {
                let geometry = self.clean(&iso3, &id, &geometry)?;
                Some(Region { id, iso3, level, name, geometry })
            })
            .collect();

        debug!(iso3, level, kept = regions.len(), total, "loaded regions");
        Ok(regions)
    }

    /// Thin the rings, then drop small parts. A geometry the area filter would
    /// erase entirely is kept with all its parts; non-polygonal geometry is discarded.
    fn clean(&self, iso3: &str, id: &str, geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
        let geometry = &self.policy.thin(geometry);
        let cleaned = match self.policy.simplify(geometry, iso3) {
            SimplifyOutcome::Simplified(mp) => Some(mp),
            SimplifyOutcome::Unchanged(geometry) => common::as_multipolygon(&geometry),
            SimplifyOutcome::Invalid(InvalidReason::AllPartsBelowThreshold) => {
                warn!(iso3, id, "area filter would remove every part, keeping all parts");
                common::as_multipolygon(geometry)
            }
            SimplifyOutcome::Invalid(InvalidReason::Unsupported(kind)) => {
                warn!(iso3, id, kind, "dropping unsupported geometry");
                None
            }
        };
        cleaned.filter(|mp| !mp.0.is_empty())
    }
}
