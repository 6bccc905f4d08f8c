mod batch;
mod country;

use std::path::PathBuf;

pub use batch::{BatchReport, Exclusion};
pub use country::CountryRun;

use crate::{country::CountryCatalog, geom::SimplifyPolicy, source::BoundarySource, store::ArtifactStore};

/// The boundary → raster → decile pipeline over a country catalog.
pub struct Pipeline<'a> {
    catalog: &'a CountryCatalog,
    source: &'a dyn BoundarySource,
    store: &'a dyn ArtifactStore,
    raster: PathBuf,
    policy: SimplifyPolicy,
    clip_margin_deg: f64,
    threads: Option<usize>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        catalog: &'a CountryCatalog,
        source: &'a dyn BoundarySource,
        store: &'a dyn ArtifactStore,
        raster: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            source,
            store,
            raster: raster.into(),
            policy: SimplifyPolicy::default(),
            clip_margin_deg: 0.1,
            threads: None,
        }
    }

    pub fn with_policy(mut self, policy: SimplifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clip_margin(mut self, degrees: f64) -> Self {
        self.clip_margin_deg = degrees;
        self
    }

    /// Run countries on a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }
}
