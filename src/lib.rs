#![doc = "Population-density deciles per country from administrative boundaries and a population raster"]
mod common;
mod config;
mod country;
mod error;
mod geom;
mod pipeline;
mod raster;
mod source;
mod stats;
mod store;

#[doc(inline)]
pub use config::PipelineConfig;

#[doc(inline)]
pub use country::{Country, CountryCatalog};

#[doc(inline)]
pub use error::CountryError;

#[doc(inline)]
pub use geom::{InvalidReason, SimplifyOutcome, SimplifyPolicy, area_km2};

#[doc(inline)]
pub use pipeline::{BatchReport, CountryRun, Exclusion, Pipeline};

#[doc(inline)]
pub use raster::{ClipOutcome, RasterClipper, ZonalAggregator, ZonalStat};

#[doc(inline)]
pub use source::{BoundaryFeature, BoundarySource, GeometrySource, MemorySource, Region, ShapefileSource};

#[doc(inline)]
pub use stats::{
    ClassifiedRegion, CountryDecileSummary, DecileAssignment, DecileClassifier, EmptyQuantile,
    GlobalAggregator, GroupFailure, GroupKey, GroupedClassification, PopEstimate, RegionalDataset,
    RegionalStat, ScenarioRow, classify_groups_csv, quantile_edges,
};

#[doc(inline)]
pub use store::{ArtifactKey, ArtifactStore, DiskStore, MemStore, Metric};

/// Run the full batch described by `config`.
pub fn run_batch(config: &PipelineConfig) -> anyhow::Result<BatchReport> {
    let catalog = CountryCatalog::read_from_csv(&config.countries)?;
    let source = ShapefileSource::new(&config.boundaries, config.layer_pattern.as_str())?;
    let store = DiskStore::open(&config.output)?;

    Pipeline::new(&catalog, &source, &store, &config.raster)
        .with_policy(config.simplify.clone())
        .with_clip_margin(config.clip_margin_deg)
        .with_threads(config.threads)
        .run()
}
