use std::fmt;

/// Column summed into the wide per-decile tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Population,
    AreaKm2,
}

impl Metric {
    /// Column name in the regional and summary tables.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Population => "population",
            Metric::AreaKm2 => "area_km2",
        }
    }
}

/// Address of one artifact, relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    /// Simplified level-0 boundary of a country.
    NationalOutline { iso3: String },
    /// Simplified regions of a country at one admin level.
    Regions { iso3: String, level: u8 },
    /// Population raster clipped to the national outline.
    CountryRaster { iso3: String },
    /// Per-region population, area and density.
    RegionalStats { iso3: String },
    /// Regional statistics with decile labels.
    RegionalDeciles { iso3: String },
    DecileSummary,
    WideTable(Metric),
    ExcludedCountries,
    PopEstimates,
}

impl ArtifactKey {
    pub fn national_outline(iso3: &str) -> Self { Self::NationalOutline { iso3: iso3.to_string() } }

    pub fn regions(iso3: &str, level: u8) -> Self { Self::Regions { iso3: iso3.to_string(), level } }

    pub fn country_raster(iso3: &str) -> Self { Self::CountryRaster { iso3: iso3.to_string() } }

    pub fn regional_stats(iso3: &str) -> Self { Self::RegionalStats { iso3: iso3.to_string() } }

    pub fn regional_deciles(iso3: &str) -> Self { Self::RegionalDeciles { iso3: iso3.to_string() } }

    /// Store-relative path, using `/` separators.
    pub fn path(&self) -> String {
        match self {
            Self::NationalOutline { iso3 } => format!("{iso3}/national_outline.geojson"),
            Self::Regions { iso3, level } => format!("{iso3}/regions/regions_{level}_{iso3}.geojson"),
            Self::CountryRaster { iso3 } => format!("{iso3}/population.tif"),
            Self::RegionalStats { iso3 } => format!("{iso3}/regional_data.csv"),
            Self::RegionalDeciles { iso3 } => format!("{iso3}/regional_data_deciles.csv"),
            Self::DecileSummary => "decile_summary.csv".to_string(),
            Self::WideTable(metric) => format!("all_pop_data_{}.csv", metric.column()),
            Self::ExcludedCountries => "excluded_countries.csv".to_string(),
            Self::PopEstimates => "pop_estimates.csv".to_string(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
