use std::collections::BTreeMap;

use anyhow::Result;

use crate::source::{BoundaryFeature, BoundarySource};

/// Boundaries held in memory, keyed by (iso3, level).
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    layers: BTreeMap<(String, u8), Vec<BoundaryFeature>>,
}

impl MemorySource {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, feature: BoundaryFeature) {
        self.layers.entry((feature.iso3.clone(), feature.level)).or_default().push(feature);
    }

    pub fn with(mut self, feature: BoundaryFeature) -> Self {
        self.insert(feature);
        self
    }
}

impl BoundarySource for MemorySource {
    fn features(&self, iso3: &str, level: u8) -> Result<Vec<BoundaryFeature>> {
        Ok(self.layers.get(&(iso3.to_string(), level)).cloned().unwrap_or_default())
    }
}
