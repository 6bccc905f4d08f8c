use std::path::PathBuf;

use anyhow::{Result, ensure};
use tracing::debug;

use crate::{common, source::{BoundaryFeature, BoundarySource}};

/// GADM-style shapefiles, one file per admin level, all countries per file.
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    dir: PathBuf,
    /// File name with a `{level}` placeholder, e.g. `gadm36_{level}.shp`.
    pattern: String,
}

impl ShapefileSource {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        let pattern = pattern.into();
        common::require_dir_exists(&dir)?;
        ensure!(pattern.contains("{level}"), "layer pattern {pattern:?} must contain {{level}}");
        Ok(Self { dir, pattern })
    }

    /// Path of the shapefile holding admin `level`.
    pub fn layer_path(&self, level: u8) -> PathBuf {
        self.dir.join(self.pattern.replace("{level}", &level.to_string()))
    }
}

impl BoundarySource for ShapefileSource {
    fn features(&self, iso3: &str, level: u8) -> Result<Vec<BoundaryFeature>> {
        let path = self.layer_path(level);
        let id_field = format!("GID_{level}");
        let name_field = format!("NAME_{level}");

        let items = common::read_shapefile_filtered(&path, |record| {
            common::character_field(record, "GID_0").as_deref() == Some(iso3)
        })?;

        let mut features = Vec::with_capacity(items.len());
        for (shape, record) in items {
            let id = common::require_character_field(&record, &id_field)?;
            let Some(geometry) = common::shape_to_geometry(&shape) else {
                debug!(iso3, level, id = %id, shape = ?shape.shapetype(), "skipping non-polygon shape");
                continue;
            };
            features.push(BoundaryFeature {
                iso3: iso3.to_string(),
                level,
                id,
                name: common::character_field(&record, &name_field).filter(|s| !s.is_empty()),
                geometry,
            });
        }

        debug!(iso3, level, count = features.len(), path = %path.display(), "read boundary features");
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_path_substitutes_level() {
        let dir = tempfile::tempdir().unwrap();
        let source = ShapefileSource::new(dir.path(), "gadm36_{level}.shp").unwrap();
        assert_eq!(source.layer_path(2), dir.path().join("gadm36_2.shp"));
    }

    #[test]
    fn pattern_without_placeholder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ShapefileSource::new(dir.path(), "gadm36.shp").is_err());
    }

    #[test]
    fn missing_layer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ShapefileSource::new(dir.path(), "gadm36_{level}.shp").unwrap();
        assert!(source.features("AAA", 1).is_err());
    }
}
