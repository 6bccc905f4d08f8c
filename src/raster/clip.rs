use std::{fs::File, io::{BufReader, Cursor}, path::Path};

use anyhow::Context;
use geo::{BoundingRect, MultiPolygon};
use popgrid::GridError;
use tracing::{debug, info};

use crate::{common, error::CountryError, store::{ArtifactKey, ArtifactStore}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// The country raster was already stored; nothing was read.
    Cached,
    /// A new country raster was written.
    Clipped { width: usize, height: usize, cells: usize },
}

/// Cuts per-country tiles out of the global population raster.
pub struct RasterClipper<'a> {
    store: &'a dyn ArtifactStore,
    raster: &'a Path,
    margin_deg: f64,
}

impl<'a> RasterClipper<'a> {
    pub fn new(store: &'a dyn ArtifactStore, raster: &'a Path, margin_deg: f64) -> Self {
        Self { store, raster, margin_deg }
    }

    /// Clip the global raster to the stored national outline of `iso3`.
    pub fn clip(&self, iso3: &str) -> Result<ClipOutcome, CountryError> {
        let raster_key = ArtifactKey::country_raster(iso3);
        if self.store.exists(&raster_key) {
            debug!(iso3, "country raster cached");
            return Ok(ClipOutcome::Cached);
        }

        let outline_key = ArtifactKey::national_outline(iso3);
        if !self.store.exists(&outline_key) {
            return Err(CountryError::MissingDependency(outline_key));
        }
        let outline = MultiPolygon(
            common::read_from_geojson_bytes(&self.store.load(&outline_key)?)?
                .into_iter()
                .flat_map(|(mp, _)| mp.0)
                .collect(),
        );

        let mut rect = outline.bounding_rect().ok_or(CountryError::DegenerateGeometry { level: 0 })?;
        let margin = geo::Coord { x: self.margin_deg, y: self.margin_deg };
        rect = geo::Rect::new(rect.min() - margin, rect.max() + margin);

        let raster_error = |source: GridError| CountryError::RasterRead { path: self.raster.to_path_buf(), source };
        let file = File::open(self.raster).map_err(|e| raster_error(e.into()))?;
        let mut grid = popgrid::read_geotiff_window(BufReader::new(file), &rect).map_err(raster_error)?;
        let cells = grid.mask(&outline);

        let mut bytes = Cursor::new(Vec::new());
        popgrid::write_geotiff(&grid, &mut bytes).map_err(raster_error)?;
        self.store.store(&raster_key, bytes.get_ref())
            .with_context(|| format!("store {raster_key}"))?;

        info!(iso3, width = grid.width(), height = grid.height(), cells, "clipped population raster");
        Ok(ClipOutcome::Clipped { width: grid.width(), height: grid.height(), cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use geo::polygon;
    use popgrid::{GeoTransform, Grid};
    use serde_json::json;

    /// 1-degree global raster covering (0, 0)-(10, 10), every cell = 1.
    fn global_raster(dir: &Path) -> std::path::PathBuf {
        let grid = Grid::filled(GeoTransform::new(0.0, 10.0, 1.0, 1.0), 10, 10, Some(-1.0), 1.0);
        let path = dir.join("global.tif");
        popgrid::write_geotiff(&grid, File::create(&path).unwrap()).unwrap();
        path
    }

    fn store_outline(store: &MemStore, iso3: &str, outline: MultiPolygon<f64>) {
        let bytes = common::write_to_geojson_bytes(&[(outline, json!({}))]).unwrap();
        store.store(&ArtifactKey::national_outline(iso3), &bytes).unwrap();
    }

    #[test]
    fn clips_and_masks_to_outline() {
        let dir = tempfile::tempdir().unwrap();
        let raster = global_raster(dir.path());
        let store = MemStore::new();
        store_outline(&store, "AAA", MultiPolygon(vec![polygon![
            (x: 2.0, y: 2.0), (x: 5.0, y: 2.0), (x: 5.0, y: 4.0), (x: 2.0, y: 4.0), (x: 2.0, y: 2.0),
        ]]));

        let clipper = RasterClipper::new(&store, &raster, 0.1);
        let outcome = clipper.clip("AAA").unwrap();
        assert_eq!(outcome, ClipOutcome::Clipped { width: 5, height: 4, cells: 6 });

        let grid = popgrid::read_geotiff(Cursor::new(store.load(&ArtifactKey::country_raster("AAA")).unwrap().to_vec())).unwrap();
        assert_eq!(grid.data().iter().filter(|&&v| v == 1.0).count(), 6);

        assert_eq!(clipper.clip("AAA").unwrap(), ClipOutcome::Cached);
    }

    #[test]
    fn missing_outline_is_a_dependency_error() {
        let dir = tempfile::tempdir().unwrap();
        let raster = global_raster(dir.path());
        let store = MemStore::new();
        let err = RasterClipper::new(&store, &raster, 0.1).clip("BBB").unwrap_err();
        assert!(matches!(err, CountryError::MissingDependency(ArtifactKey::NationalOutline { .. })));
    }

    #[test]
    fn outline_off_the_raster_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let raster = global_raster(dir.path());
        let store = MemStore::new();
        store_outline(&store, "CCC", MultiPolygon(vec![polygon![
            (x: 50.0, y: 50.0), (x: 51.0, y: 50.0), (x: 51.0, y: 51.0), (x: 50.0, y: 50.0),
        ]]));
        let err = RasterClipper::new(&store, &raster, 0.1).clip("CCC").unwrap_err();
        assert!(matches!(err, CountryError::RasterRead { source: GridError::OutOfBounds, .. }));
    }
}
