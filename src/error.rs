use std::path::PathBuf;

use popgrid::GridError;
use thiserror::Error;

use crate::{stats::EmptyQuantile, store::ArtifactKey};

/// Why a country was left out of a batch.
#[derive(Debug, Error)]
pub enum CountryError {
    /// A required upstream artifact is absent.
    #[error("missing artifact {0}")]
    MissingDependency(ArtifactKey),

    /// No usable region geometry for the country.
    #[error("no usable regions at admin level {level}")]
    DegenerateGeometry { level: u8 },

    #[error(transparent)]
    EmptyQuantile(#[from] EmptyQuantile),

    #[error("cannot read raster {}: {source}", path.display())]
    RasterRead { path: PathBuf, source: GridError },

    /// Store, CSV or shapefile failures.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl CountryError {
    /// Short variant name, as written to the exclusion report.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingDependency(_) => "MissingDependency",
            Self::DegenerateGeometry { .. } => "DegenerateGeometry",
            Self::EmptyQuantile(_) => "EmptyQuantile",
            Self::RasterRead { .. } => "RasterRead",
            Self::Io(_) => "Io",
        }
    }
}
