use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;

use crate::{common, country::CountryCatalog, stats::ClassifiedRegion, store::Metric};

/// Totals of one decile within one country.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryDecileSummary {
    pub iso3: String,
    pub decile: u8,
    pub population: f64,
    pub area_km2: i64,
    /// Summed population over summed area.
    pub density: f64,
}

/// Raster population estimate of a country next to its reference figure.
#[derive(Debug, Clone, PartialEq)]
pub struct PopEstimate {
    pub iso3: String,
    pub estimate: f64,
    pub reference: f64,
}

impl PopEstimate {
    /// Relative error in percent of the estimate; `None` when the estimate is 0.
    pub fn difference_perc(&self) -> Option<f64> {
        (self.estimate != 0.0).then(|| (self.estimate - self.reference) / self.estimate * 100.0)
    }
}

/// Consolidates decile-labelled regions of every country.
pub struct GlobalAggregator;

impl GlobalAggregator {
    /// One row per (country, decile) present, sorted by ISO3 then decile.
    pub fn aggregate_all(regions: &[ClassifiedRegion]) -> Result<Vec<CountryDecileSummary>> {
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let df = DataFrame::new(vec![
            Column::new("GID_0".into(), regions.iter().map(|r| r.stat.iso3.as_str()).collect::<Vec<_>>()),
            Column::new("decile".into(), regions.iter().map(|r| r.decile as i64).collect::<Vec<_>>()),
            Column::new("population".into(), regions.iter().map(|r| r.stat.population).collect::<Vec<_>>()),
            Column::new("area_km2".into(), regions.iter().map(|r| r.stat.area_km2).collect::<Vec<_>>()),
        ])?;

        let grouped = df.lazy()
            .group_by_stable([col("GID_0"), col("decile")])
            .agg([col("population").sum(), col("area_km2").sum()])
            .sort(["GID_0", "decile"], SortMultipleOptions::default())
            .collect()?;

        let iso3 = common::string_column(&grouped, "GID_0")?;
        let decile = common::i64_column(&grouped, "decile")?;
        let population = common::f64_column(&grouped, "population")?;
        let area = common::i64_column(&grouped, "area_km2")?;

        Ok((0..grouped.height())
            .map(|i| {
                let population = population[i].unwrap_or(0.0);
                let area_km2 = area[i].unwrap_or(0);
                CountryDecileSummary {
                    iso3: iso3[i].clone(),
                    decile: decile[i].unwrap_or(0) as u8,
                    population,
                    area_km2,
                    density: if area_km2 > 0 { population / area_km2 as f64 } else { 0.0 },
                }
            })
            .collect())
    }

    /// `GID_0, decile, population, area_km2, population_km2`.
    pub fn summary_csv(rows: &[CountryDecileSummary]) -> Result<Vec<u8>> {
        let df = DataFrame::new(vec![
            Column::new("GID_0".into(), rows.iter().map(|r| r.iso3.as_str()).collect::<Vec<_>>()),
            Column::new("decile".into(), rows.iter().map(|r| r.decile as i64).collect::<Vec<_>>()),
            Column::new("population".into(), rows.iter().map(|r| r.population).collect::<Vec<_>>()),
            Column::new("area_km2".into(), rows.iter().map(|r| r.area_km2).collect::<Vec<_>>()),
            Column::new("population_km2".into(), rows.iter().map(|r| r.density).collect::<Vec<_>>()),
        ])?;
        common::write_to_csv_bytes(&df)
    }

    /// One row per country: `GID_0, country_name, Decile 1 … Decile 10`, where
    /// `Decile d` holds the metric total of label `10 * d`. Absent deciles are 0.
    pub fn wide_table_csv(rows: &[CountryDecileSummary], metric: Metric, catalog: &CountryCatalog) -> Result<Vec<u8>> {
        let mut table: BTreeMap<&str, [f64; 10]> = BTreeMap::new();
        for row in rows {
            let slot = table.entry(row.iso3.as_str()).or_insert([0.0; 10]);
            if let Some(d) = (row.decile as usize / 10).checked_sub(1).filter(|&d| d < 10) {
                slot[d] += match metric {
                    Metric::Population => row.population,
                    Metric::AreaKm2 => row.area_km2 as f64,
                };
            }
        }

        let mut columns = vec![
            Column::new("GID_0".into(), table.keys().copied().collect::<Vec<_>>()),
            Column::new("country_name".into(), table.keys().map(|&iso3| catalog.name_of(iso3)).collect::<Vec<_>>()),
        ];
        for d in 0..10 {
            let name = format!("Decile {}", d + 1);
            columns.push(match metric {
                Metric::Population => Column::new(name.into(), table.values().map(|v| v[d]).collect::<Vec<_>>()),
                Metric::AreaKm2 => Column::new(name.into(), table.values().map(|v| v[d] as i64).collect::<Vec<_>>()),
            });
        }

        common::write_to_csv_bytes(&DataFrame::new(columns)?)
    }

    /// `GID_0, country_name, pop_estimate, pop_true, difference_perc`.
    pub fn pop_estimates_csv(estimates: &[PopEstimate], catalog: &CountryCatalog) -> Result<Vec<u8>> {
        let df = DataFrame::new(vec![
            Column::new("GID_0".into(), estimates.iter().map(|e| e.iso3.as_str()).collect::<Vec<_>>()),
            Column::new("country_name".into(), estimates.iter().map(|e| catalog.name_of(&e.iso3)).collect::<Vec<_>>()),
            Column::new("pop_estimate".into(), estimates.iter().map(|e| e.estimate).collect::<Vec<_>>()),
            Column::new("pop_true".into(), estimates.iter().map(|e| e.reference).collect::<Vec<_>>()),
            Column::new("difference_perc".into(), estimates.iter().map(PopEstimate::difference_perc).collect::<Vec<_>>()),
        ])?;
        common::write_to_csv_bytes(&df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{country::Country, stats::RegionalStat};

    fn region(iso3: &str, id: &str, population: f64, area_km2: i64, decile: u8) -> ClassifiedRegion {
        ClassifiedRegion { stat: RegionalStat::new(iso3, id, 1, population, area_km2), decile }
    }

    fn catalog() -> CountryCatalog {
        let country = |iso3: &str, name: &str| Country {
            iso3: iso3.into(), name: name.into(), iso2: String::new(),
            max_depth: 1, in_scope: true, population: None,
        };
        CountryCatalog::new(vec![country("AAA", "Alpha"), country("BBB", "Beta")]).unwrap()
    }

    #[test]
    fn density_comes_from_sums() {
        // Mean of the region densities would be (1 + 10) / 2 = 5.5.
        let regions = [region("AAA", "a", 10.0, 10, 100), region("AAA", "b", 100.0, 10, 100)];
        let rows = GlobalAggregator::aggregate_all(&regions).unwrap();
        assert_eq!(rows, vec![CountryDecileSummary {
            iso3: "AAA".into(), decile: 100, population: 110.0, area_km2: 20, density: 5.5,
        }]);

        let regions = [region("AAA", "a", 10.0, 1, 100), region("AAA", "b", 100.0, 9, 100)];
        let rows = GlobalAggregator::aggregate_all(&regions).unwrap();
        assert_eq!(rows[0].density, 11.0);
    }

    #[test]
    fn rows_are_sorted_by_country_then_decile() {
        let regions = [
            region("BBB", "x", 1.0, 1, 20),
            region("AAA", "y", 1.0, 1, 100),
            region("BBB", "z", 1.0, 1, 10),
            region("AAA", "w", 1.0, 1, 10),
        ];
        let keys: Vec<_> = GlobalAggregator::aggregate_all(&regions).unwrap()
            .into_iter().map(|r| (r.iso3, r.decile)).collect();
        assert_eq!(keys, vec![
            ("AAA".to_string(), 10), ("AAA".to_string(), 100),
            ("BBB".to_string(), 10), ("BBB".to_string(), 20),
        ]);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert!(GlobalAggregator::aggregate_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn wide_table_fills_missing_deciles() {
        let rows = GlobalAggregator::aggregate_all(&[
            region("AAA", "a", 5.0, 2, 10),
            region("AAA", "b", 7.0, 3, 100),
        ]).unwrap();
        let bytes = GlobalAggregator::wide_table_csv(&rows, Metric::Population, &catalog()).unwrap();
        let df = common::read_from_csv_bytes(&bytes, &[("GID_0", DataType::String)]).unwrap();

        assert_eq!(common::string_column(&df, "country_name").unwrap(), vec!["Alpha"]);
        assert_eq!(common::f64_column(&df, "Decile 1").unwrap(), vec![Some(5.0)]);
        assert_eq!(common::f64_column(&df, "Decile 5").unwrap(), vec![Some(0.0)]);
        assert_eq!(common::f64_column(&df, "Decile 10").unwrap(), vec![Some(7.0)]);
    }

    #[test]
    fn difference_is_relative_to_estimate() {
        let e = PopEstimate { iso3: "AAA".into(), estimate: 200.0, reference: 150.0 };
        assert_eq!(e.difference_perc(), Some(25.0));
        assert_eq!(PopEstimate { estimate: 0.0, ..e }.difference_perc(), None);
    }
}
