use anyhow::{Context, Result, ensure};
use polars::prelude::*;

use crate::common;

/// Population, area and density of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalStat {
    pub iso3: String,
    pub id: String,
    pub level: u8,
    pub population: f64,
    pub area_km2: i64,
    /// People per km², or 0 when the area rounds to zero.
    pub density: f64,
}

impl RegionalStat {
    pub fn new(iso3: impl Into<String>, id: impl Into<String>, level: u8, population: f64, area_km2: i64) -> Self {
        let density = if area_km2 > 0 { population / area_km2 as f64 } else { 0.0 };
        Self { iso3: iso3.into(), id: id.into(), level, population, area_km2, density }
    }

    /// Regions with no area cannot be ranked by density.
    #[inline]
    pub fn is_classifiable(&self) -> bool { self.area_km2 > 0 }
}

/// A region with its decile label (10 = least dense, 100 = most dense).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRegion {
    pub stat: RegionalStat,
    pub decile: u8,
}

/// All regional statistics of one country.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionalDataset {
    pub iso3: String,
    pub rows: Vec<RegionalStat>,
}

const ID_DTYPES: [(&str, DataType); 2] = [("GID_0", DataType::String), ("GID_id", DataType::String)];

impl RegionalDataset {
    pub fn new(iso3: impl Into<String>, rows: Vec<RegionalStat>) -> Self {
        Self { iso3: iso3.into(), rows }
    }

    /// Sum of population over every region, classifiable or not.
    pub fn total_population(&self) -> f64 {
        self.rows.iter().map(|r| r.population).sum()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        stats_dataframe(&self.rows)
    }

    /// Encode as `GID_0, GID_id, GID_level, population, area_km2, population_km2`.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        common::write_to_csv_bytes(&self.to_dataframe()?)
    }

    pub fn from_csv_bytes(iso3: &str, bytes: &[u8]) -> Result<Self> {
        let df = common::read_from_csv_bytes(bytes, &ID_DTYPES)?;
        let rows = stats_from_dataframe(&df)
            .with_context(|| format!("invalid regional data for {iso3}"))?;
        ensure!(
            rows.iter().all(|r| r.iso3 == iso3),
            "regional data for {iso3} contains rows of another country"
        );
        Ok(Self::new(iso3, rows))
    }
}

impl ClassifiedRegion {
    /// Encode as the regional columns plus `decile`.
    pub fn to_csv_bytes(regions: &[ClassifiedRegion]) -> Result<Vec<u8>> {
        let stats: Vec<_> = regions.iter().map(|r| r.stat.clone()).collect();
        let mut df = stats_dataframe(&stats)?;
        df.with_column(Column::new(
            "decile".into(),
            regions.iter().map(|r| r.decile as i64).collect::<Vec<_>>(),
        ))?;
        common::write_to_csv_bytes(&df)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Vec<ClassifiedRegion>> {
        let df = common::read_from_csv_bytes(bytes, &ID_DTYPES)?;
        let stats = stats_from_dataframe(&df)?;
        let deciles = common::i64_column(&df, "decile")?;
        stats.into_iter().zip(deciles)
            .map(|(stat, decile)| {
                let decile = decile.and_then(|d| u8::try_from(d).ok())
                    .with_context(|| format!("region {}: invalid decile", stat.id))?;
                Ok(ClassifiedRegion { stat, decile })
            })
            .collect()
    }
}

fn stats_dataframe(rows: &[RegionalStat]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("GID_0".into(), rows.iter().map(|r| r.iso3.as_str()).collect::<Vec<_>>()),
        Column::new("GID_id".into(), rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()),
        Column::new("GID_level".into(), rows.iter().map(|r| r.level as i64).collect::<Vec<_>>()),
        Column::new("population".into(), rows.iter().map(|r| r.population).collect::<Vec<_>>()),
        Column::new("area_km2".into(), rows.iter().map(|r| r.area_km2).collect::<Vec<_>>()),
        Column::new("population_km2".into(), rows.iter().map(|r| r.density).collect::<Vec<_>>()),
    ])?)
}

/// Rebuild rows from a regional table. Density is recomputed from population and area.
fn stats_from_dataframe(df: &DataFrame) -> Result<Vec<RegionalStat>> {
    let iso3 = common::string_column(df, "GID_0")?;
    let ids = common::string_column(df, "GID_id")?;
    let levels = common::i64_column(df, "GID_level")?;
    let population = common::f64_column(df, "population")?;
    let area = common::i64_column(df, "area_km2")?;

    (0..df.height())
        .map(|i| {
            let level = levels[i].and_then(|l| u8::try_from(l).ok())
                .with_context(|| format!("region {}: invalid GID_level", ids[i]))?;
            Ok(RegionalStat::new(
                iso3[i].clone(),
                ids[i].clone(),
                level,
                population[i].unwrap_or(0.0),
                area[i].unwrap_or(0),
            ))
        })
        .collect()
}
