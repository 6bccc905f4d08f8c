use std::{io::Cursor, path::PathBuf};

use anyhow::Context;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    common,
    country::Country,
    error::CountryError,
    pipeline::Pipeline,
    raster::{RasterClipper, ZonalAggregator},
    source::{GeometrySource, Region},
    stats::{ClassifiedRegion, DecileClassifier, RegionalDataset, RegionalStat},
    store::ArtifactKey,
};

/// Output of one country's run.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRun {
    pub iso3: String,
    pub regions: Vec<ClassifiedRegion>,
    /// Population over all regions, including those too small to classify.
    pub total_population: f64,
}

impl Pipeline<'_> {
    /// Process one country end to end. Steps whose artifact already exists are skipped;
    /// deciles are always recomputed from the regional statistics.
    pub fn process_country(&self, country: &Country) -> Result<CountryRun, CountryError> {
        let iso3 = country.iso3.as_str();
        let stats_key = ArtifactKey::regional_stats(iso3);

        let dataset = if self.store.exists(&stats_key) {
            debug!(iso3, "regional statistics cached");
            RegionalDataset::from_csv_bytes(iso3, &self.store.load(&stats_key)?)?
        } else {
            let dataset = self.regional_stats(country)?;
            self.store.store(&stats_key, &dataset.to_csv_bytes()?)
                .with_context(|| format!("store {stats_key}"))?;
            dataset
        };

        let regions = DecileClassifier::new().classify_regions(&dataset.rows)?;
        let deciles_key = ArtifactKey::regional_deciles(iso3);
        self.store.store(&deciles_key, &ClassifiedRegion::to_csv_bytes(&regions)?)
            .with_context(|| format!("store {deciles_key}"))?;

        info!(iso3, regions = dataset.rows.len(), classified = regions.len(), "country complete");
        Ok(CountryRun { iso3: iso3.to_string(), regions, total_population: dataset.total_population() })
    }

    /// Boundaries, clipped raster and zonal statistics for one country.
    fn regional_stats(&self, country: &Country) -> Result<RegionalDataset, CountryError> {
        let iso3 = country.iso3.as_str();
        let geometry = GeometrySource::new(self.source, &self.policy);

        let outline_key = ArtifactKey::national_outline(iso3);
        if !self.store.exists(&outline_key) {
            let outline = geometry.national_outline(iso3)?
                .ok_or(CountryError::DegenerateGeometry { level: 0 })?;
            let bytes = common::write_to_geojson_bytes(&[(outline, json!({ "GID_0": iso3 }))])?;
            self.store.store(&outline_key, &bytes)
                .with_context(|| format!("store {outline_key}"))?;
        }

        // Intermediate levels are persisted alongside; only the deepest feeds the statistics.
        let level = country.max_depth;
        for intermediate in 1..level {
            self.persist_regions(&geometry, iso3, intermediate)?;
        }
        let regions = self.persist_regions(&geometry, iso3, level)?;
        if regions.is_empty() {
            return Err(CountryError::DegenerateGeometry { level });
        }

        RasterClipper::new(self.store, &self.raster, self.clip_margin_deg).clip(iso3)?;
        let raster_key = ArtifactKey::country_raster(iso3);
        let grid = popgrid::read_geotiff(Cursor::new(self.store.load(&raster_key)?))
            .map_err(|source| CountryError::RasterRead { path: PathBuf::from(raster_key.path()), source })?;

        let zonal = ZonalAggregator::new(&grid);
        let rows = regions.iter()
            .map(|region| {
                let stat = zonal.aggregate(&region.geometry);
                RegionalStat::new(iso3, region.id.as_str(), region.level, stat.population, stat.area_km2)
            })
            .collect();

        Ok(RegionalDataset::new(iso3, rows))
    }

    /// Regions of `iso3` at `level`, read from the store or built and stored.
    fn persist_regions(&self, geometry: &GeometrySource<'_>, iso3: &str, level: u8) -> anyhow::Result<Vec<Region>> {
        let key = ArtifactKey::regions(iso3, level);
        if self.store.exists(&key) {
            return Region::from_geojson(&self.store.load(&key)?);
        }

        let regions = geometry.regions(iso3, level)?;
        if !regions.is_empty() {
            self.store.store(&key, &Region::to_geojson(&regions)?)
                .with_context(|| format!("store {key}"))?;
        }
        Ok(regions)
    }
}
