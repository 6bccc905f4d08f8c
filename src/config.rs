use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geom::SimplifyPolicy;

/// Inputs, outputs and tuning of a batch run, read from JSON.
/// Relative paths are resolved against the directory of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Country reference CSV.
    pub countries: PathBuf,
    /// Directory holding the per-level boundary shapefiles.
    pub boundaries: PathBuf,
    /// Shapefile name with a `{level}` placeholder.
    pub layer_pattern: String,
    /// Global population GeoTIFF.
    pub raster: PathBuf,
    /// Root of the artifact store.
    pub output: PathBuf,
    /// Degrees added on every side of a country's bounding box before clipping.
    pub clip_margin_deg: f64,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub simplify: SimplifyPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            countries: "data/countries.csv".into(),
            boundaries: "data/gadm36".into(),
            layer_pattern: "gadm36_{level}.shp".into(),
            raster: "data/ppp_2020_1km_Aggregated.tif".into(),
            output: "results".into(),
            clip_margin_deg: 0.1,
            threads: None,
            simplify: SimplifyPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config.resolve(path.parent().unwrap_or(Path::new("."))))
    }

    /// Make every relative path relative to `base`.
    pub fn resolve(mut self, base: &Path) -> Self {
        for path in [&mut self.countries, &mut self.boundaries, &mut self.raster, &mut self.output] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
