use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result, ensure};
use polars::{frame::DataFrame, prelude::DataType};

use crate::common;

/// One row of the country reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub iso3: String,
    pub name: String,
    pub iso2: String,
    /// Deepest GADM admin level available for the country (0 = national only).
    pub max_depth: u8,
    /// Whether the country takes part in a batch run.
    pub in_scope: bool,
    /// Reference population used to validate raster estimates.
    pub population: Option<f64>,
}

/// Immutable lookup of countries by ISO3 code, in ascending ISO3 order.
#[derive(Debug, Clone, Default)]
pub struct CountryCatalog {
    countries: Vec<Country>,
    index: HashMap<String, usize>,
}

impl CountryCatalog {
    pub fn new(mut countries: Vec<Country>) -> Result<Self> {
        countries.sort_by(|a, b| a.iso3.cmp(&b.iso3));

        let mut index = HashMap::with_capacity(countries.len());
        for (i, country) in countries.iter().enumerate() {
            ensure!(!country.iso3.is_empty(), "country {:?} has an empty ISO3 code", country.name);
            ensure!(
                index.insert(country.iso3.clone(), i).is_none(),
                "duplicate ISO3 code in country table: {}", country.iso3
            );
        }

        Ok(Self { countries, index })
    }

    /// Load the reference CSV (`country`, `ISO_3digit`, `ISO_2digit`, `lowest`, `imf`,
    /// optional `population`).
    pub fn read_from_csv(path: &Path) -> Result<Self> {
        let df = common::read_from_csv_file(path, &Self::csv_dtypes())?;
        Self::from_dataframe(&df)
            .with_context(|| format!("Invalid country table: {}", path.display()))
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_dataframe(&common::read_from_csv_bytes(bytes, &Self::csv_dtypes())?)
    }

    fn csv_dtypes() -> [(&'static str, DataType); 3] {
        [
            ("country", DataType::String),
            ("ISO_3digit", DataType::String),
            ("ISO_2digit", DataType::String),
        ]
    }

    fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let names = common::string_column(df, "country")?;
        let iso3 = common::string_column(df, "ISO_3digit")?;
        let iso2 = df.column("ISO_2digit")?.str()?
            .into_iter()
            .map(|s| s.unwrap_or_default().trim().to_string())
            .collect::<Vec<_>>();
        let lowest = common::i64_column(df, "lowest")?;
        let imf = common::i64_column(df, "imf")?;
        let population = match df.column("population") {
            Ok(_) => common::f64_column(df, "population")?,
            Err(_) => vec![None; df.height()],
        };

        let countries = (0..df.height())
            .map(|i| {
                let max_depth = lowest[i].unwrap_or(0);
                ensure!(
                    (0..=5).contains(&max_depth),
                    "country {}: admin depth {} outside 0..=5", iso3[i], max_depth
                );
                Ok(Country {
                    iso3: iso3[i].to_uppercase(),
                    name: names[i].clone(),
                    iso2: iso2[i].clone(),
                    max_depth: max_depth as u8,
                    in_scope: imf[i] == Some(1),
                    population: population[i].filter(|p| p.is_finite()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(countries)
    }

    #[inline] pub fn len(&self) -> usize { self.countries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.countries.is_empty() }

    pub fn get(&self, iso3: &str) -> Option<&Country> {
        self.index.get(iso3).map(|&i| &self.countries[i])
    }

    /// Countries flagged for processing, in ISO3 order.
    pub fn in_scope(&self) -> impl Iterator<Item = &Country> {
        self.countries.iter().filter(|c| c.in_scope)
    }

    /// Display name for `iso3`, falling back to the code itself.
    pub fn name_of<'a>(&'a self, iso3: &'a str) -> &'a str {
        self.get(iso3).map_or(iso3, |c| c.name.as_str())
    }
}
