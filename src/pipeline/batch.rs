use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    common,
    country::Country,
    error::CountryError,
    pipeline::{CountryRun, Pipeline},
    stats::{ClassifiedRegion, CountryDecileSummary, GlobalAggregator, PopEstimate},
    store::{ArtifactKey, Metric},
};

/// A country left out of the consolidated table.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub iso3: String,
    /// Short error kind, e.g. `EmptyQuantile`.
    pub error: &'static str,
    pub reason: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub summaries: Vec<CountryDecileSummary>,
    pub excluded: Vec<Exclusion>,
    pub estimates: Vec<PopEstimate>,
}

impl BatchReport {
    /// Countries that made it into the summary.
    pub fn processed(&self) -> impl Iterator<Item = &str> {
        let mut seen: Vec<&str> = self.summaries.iter().map(|s| s.iso3.as_str()).collect();
        seen.dedup();
        seen.into_iter()
    }
}

impl Pipeline<'_> {
    /// Process every in-scope country, then write the cross-country tables.
    /// A failing country is excluded and reported; only store failures of the
    /// consolidated outputs abort the batch.
    pub fn run(&self) -> Result<BatchReport> {
        let countries: Vec<&Country> = self.catalog.in_scope().collect();
        info!(countries = countries.len(), threads = ?self.threads, "starting batch");

        let results = match self.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("build worker pool")?
                .install(|| self.process_all(&countries)),
            None => self.process_all(&countries),
        };

        let mut regions: Vec<ClassifiedRegion> = Vec::new();
        let mut report = BatchReport::default();
        for (country, result) in countries.iter().zip(results) {
            match result {
                Ok(run) => {
                    if let Some(reference) = country.population {
                        report.estimates.push(PopEstimate { iso3: run.iso3.clone(), estimate: run.total_population, reference });
                    }
                    regions.extend(run.regions);
                }
                Err(err) => {
                    let exclusion = Exclusion { iso3: country.iso3.clone(), error: err.kind(), reason: format!("{err:#}") };
                    warn!(iso3 = %exclusion.iso3, error = exclusion.error, reason = %exclusion.reason, "country excluded");
                    report.excluded.push(exclusion);
                }
            }
        }

        report.summaries = GlobalAggregator::aggregate_all(&regions)?;
        self.write_outputs(&report)?;

        info!(summaries = report.summaries.len(), excluded = report.excluded.len(), "batch complete");
        Ok(report)
    }

    fn process_all(&self, countries: &[&Country]) -> Vec<Result<CountryRun, CountryError>> {
        countries.par_iter()
            .map(|country| self.process_country(country))
            .collect()
    }

    /// Overwrite the consolidated outputs.
    fn write_outputs(&self, report: &BatchReport) -> Result<()> {
        let outputs = [
            (ArtifactKey::DecileSummary, GlobalAggregator::summary_csv(&report.summaries)?),
            (ArtifactKey::WideTable(Metric::Population), GlobalAggregator::wide_table_csv(&report.summaries, Metric::Population, self.catalog)?),
            (ArtifactKey::WideTable(Metric::AreaKm2), GlobalAggregator::wide_table_csv(&report.summaries, Metric::AreaKm2, self.catalog)?),
            (ArtifactKey::ExcludedCountries, exclusions_csv(&report.excluded)?),
            (ArtifactKey::PopEstimates, GlobalAggregator::pop_estimates_csv(&report.estimates, self.catalog)?),
        ];
        for (key, bytes) in outputs {
            self.store.store(&key, &bytes).with_context(|| format!("store {key}"))?;
        }
        Ok(())
    }
}

/// `GID_0, error, reason`.
fn exclusions_csv(excluded: &[Exclusion]) -> Result<Vec<u8>> {
    let df = DataFrame::new(vec![
        Column::new("GID_0".into(), excluded.iter().map(|e| e.iso3.as_str()).collect::<Vec<_>>()),
        Column::new("error".into(), excluded.iter().map(|e| e.error).collect::<Vec<_>>()),
        Column::new("reason".into(), excluded.iter().map(|e| e.reason.as_str()).collect::<Vec<_>>()),
    ])?;
    common::write_to_csv_bytes(&df)
}
